//! Registration: create an unverified account and mail its first OTP.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::debug;

use crate::api::email::EmailMessage;
use crate::password;
use crate::store::{now_unix, Account};

use super::errors::{AuthError, ErrorBody};
use super::state::AuthState;
use super::types::{AccountResponse, RegisterRequest};
use super::utils::{normalize_email, valid_email, valid_mobile};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, OTP emailed", body = AccountResponse),
        (status = 400, description = "Validation failure or duplicate email", body = ErrorBody),
        (status = 500, description = "OTP email could not be sent", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation(vec!["missing request body".to_string()]));
    };

    let email = normalize_email(&request.email);

    // Collect every violated field so the client can fix them in one pass.
    let mut violations = Vec::new();
    if request.name.trim().is_empty() {
        violations.push("name: must not be empty".to_string());
    }
    if !valid_email(&email) {
        violations.push("email: malformed address".to_string());
    }
    if !valid_mobile(&request.mobile) {
        violations.push("mobile: must be exactly 10 digits".to_string());
    }
    let min_len = state.config().min_password_len();
    if request.password.len() < min_len {
        violations.push(format!("password: must be at least {min_len} characters"));
    }
    if !violations.is_empty() {
        return Err(AuthError::Validation(violations));
    }

    let password_hash = password::hash(&request.password)?;
    let mut account = Account::new(
        request.role,
        request.name.trim().to_string(),
        email,
        request.mobile.clone(),
        password_hash,
    );

    let (secret, code) = state.otp().issue()?;
    let otp_ttl = i64::try_from(state.otp().step_seconds()).unwrap_or(600);
    account.set_otp_challenge(secret, now_unix() + otp_ttl);

    // The store's uniqueness constraint is the final arbiter under races.
    let account = state.store().create(account).await?;

    debug!(email = %account.email, role = account.role.as_str(), "account created, dispatching OTP");

    // A failed dispatch surfaces to the caller but never unwinds the account.
    state
        .mailer()
        .send(&EmailMessage {
            to: account.email.clone(),
            subject: "Your Aula verification code".to_string(),
            body: format!(
                "Your verification code is {code}. It expires in {} minutes.",
                otp_ttl / 60
            ),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}
