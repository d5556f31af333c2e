//! Login for verified accounts.
//!
//! Unknown email, unverified account, and wrong password all collapse into
//! the same rejection so responses don't reveal whether an email exists.

use axum::{extract::Extension, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::debug;

use crate::password;

use super::errors::{AuthError, ErrorBody};
use super::state::AuthState;
use super::types::{AccountResponse, LoginRequest, TokenResponse};
use super::utils::normalize_email;

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, bearer token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(request)) = payload else {
        return Err(AuthError::Validation(vec!["missing request body".to_string()]));
    };

    let email = normalize_email(&request.email);
    let account = state
        .store()
        .find_by_email(request.role, &email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    // The hash comparison runs before the verified check so an unverified
    // account costs the same as a wrong password.
    if !password::verify(&request.password, &account.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    if !account.is_verified {
        return Err(AuthError::InvalidCredentials);
    }

    debug!(email = %account.email, "login successful");

    let token = state.tokens().issue(account.id, &account.email)?;
    Ok(Json(TokenResponse {
        token,
        account: AccountResponse::from(&account),
    }))
}
