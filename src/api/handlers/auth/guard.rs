//! Bearer-token guard for protected routes.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use super::errors::AuthError;
use super::state::AuthState;
use super::utils::extract_bearer_token;

/// Reject the request unless a valid bearer token is presented; on success
/// the decoded claims are attached to the request extensions.
pub async fn require_auth(
    state: Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_bearer_token(request.headers()).ok_or(AuthError::Unauthenticated)?;

    let claims = state.tokens().verify(&token).map_err(|err| {
        debug!("bearer token rejected: {err}");
        AuthError::InvalidToken
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
