//! Password reset: request a tokenized link, then complete with a new password.

use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::debug;

use crate::api::email::EmailMessage;
use crate::password;
use crate::store::now_unix;

use super::errors::{AuthError, ErrorBody};
use super::state::AuthState;
use super::types::{AckResponse, RequestPasswordResetRequest, ResetPasswordRequest};
use super::utils::{build_reset_url, generate_reset_token, hash_reset_token, normalize_email};

#[utoipa::path(
    post,
    path = "/api/auth/request-password-reset",
    request_body = RequestPasswordResetRequest,
    responses(
        (status = 200, description = "Reset email dispatched", body = AckResponse),
        (status = 400, description = "No account for that email", body = ErrorBody),
        (status = 500, description = "Reset email could not be sent", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn request_password_reset(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RequestPasswordResetRequest>>,
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

    // Only the hash is stored; the raw token travels in the email alone.
    let token = generate_reset_token()?;
    let expires = now_unix() + state.config().reset_ttl_seconds();
    account.set_reset_challenge(hash_reset_token(&token), expires);
    state.store().save(&account).await?;

    debug!(email = %account.email, "reset token stored, dispatching email");

    let reset_url = build_reset_url(state.config().frontend_base_url(), &token);
    // The stored token is not reverted when dispatch fails; the caller sees
    // the mail error and may retry the request.
    state
        .mailer()
        .send(&EmailMessage {
            to: account.email.clone(),
            subject: "Reset your Aula password".to_string(),
            body: format!(
                "Use this link to reset your password: {reset_url}\nThe link expires in {} minutes.",
                state.config().reset_ttl_seconds() / 60
            ),
        })
        .await?;

    Ok(Json(AckResponse {
        message: "Password reset email sent".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = AckResponse),
        (status = 400, description = "Token mismatch or expired", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation(vec!["missing request body".to_string()]));
    };

    let min_len = state.config().min_password_len();
    if request.new_password.len() < min_len {
        return Err(AuthError::Validation(vec![format!(
            "newPassword: must be at least {min_len} characters"
        )]));
    }

    let email = normalize_email(&request.email);
    let mut account = state
        .store()
        .find_by_email(request.role, &email)
        .await?
        .ok_or(AuthError::InvalidOrExpiredToken)?;

    let (stored_hash, expires_unix) = account
        .reset_challenge()
        .map(|(hash, expires)| (hash.to_vec(), expires))
        .ok_or(AuthError::InvalidOrExpiredToken)?;

    if hash_reset_token(request.token.trim()) != stored_hash || now_unix() > expires_unix {
        return Err(AuthError::InvalidOrExpiredToken);
    }

    let password_hash = password::hash(&request.new_password)?;
    account.complete_reset(password_hash);
    state.store().save(&account).await?;

    debug!(email = %account.email, "password reset completed");

    Ok(Json(AckResponse {
        message: "Password has been reset".to_string(),
    }))
}
