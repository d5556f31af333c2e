//! OTP verification: flips the account to verified and mints its first token.

use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::debug;

use crate::store::now_unix;

use super::errors::{AuthError, ErrorBody};
use super::state::AuthState;
use super::types::{AccountResponse, TokenResponse, VerifyOtpRequest};
use super::utils::normalize_email;

#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Account verified, bearer token issued", body = TokenResponse),
        (status = 400, description = "Unknown account, stale or wrong OTP", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation(vec!["missing request body".to_string()]));
    };

    let email = normalize_email(&request.email);
    let mut account = state
        .store()
        .find_by_email(request.role, &email)
        .await?
        .ok_or(AuthError::NotFound)?;

    if account.is_verified {
        return Err(AuthError::AlreadyVerified);
    }

    let (secret, expires_unix) = match account.otp_challenge() {
        Some((secret, expires_unix)) => (secret.to_string(), expires_unix),
        None => return Err(AuthError::NoOtpPending),
    };

    // Wall-clock expiry is checked before the code itself; the derivation
    // window and the stored expiry must both agree.
    if now_unix() > expires_unix {
        return Err(AuthError::OtpExpired);
    }

    if !state.otp().verify(request.otp.trim(), &secret) {
        return Err(AuthError::InvalidOtp);
    }

    // Single use: clearing the pair here makes the same code unverifiable
    // even within its time window.
    account.mark_verified();
    state.store().save(&account).await?;

    debug!(email = %account.email, "account verified");

    let token = state.tokens().issue(account.id, &account.email)?;
    Ok(Json(TokenResponse {
        token,
        account: AccountResponse::from(&account),
    }))
}
