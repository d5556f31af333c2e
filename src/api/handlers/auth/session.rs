//! Logout and the token-guarded echo route.

use axum::{extract::Extension, response::IntoResponse, Json};

use crate::token::Claims;

use super::errors::{AuthError, ErrorBody};
use super::types::{AckResponse, ClaimsResponse};

/// Logout is stateless on the server: the client discards its token, and the
/// token stays valid until its natural one-hour expiry.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Acknowledged", body = AckResponse)
    ),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    Json(AckResponse {
        message: "Logged out".to_string(),
    })
}

/// Echo the claims the guard attached; only reachable with a valid bearer token.
#[utoipa::path(
    get,
    path = "/api/protected",
    responses(
        (status = 200, description = "Token accepted, claims echoed", body = ClaimsResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn protected(claims: Extension<Claims>) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(ClaimsResponse::from(&claims.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn logout_acknowledges() {
        let response = logout().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_echoes_claims() {
        let claims = Claims {
            sub: "account-id".to_string(),
            email: "alice@example.com".to_string(),
            iat: 0,
            exp: 0,
        };
        let result = protected(Extension(claims)).await.map(IntoResponse::into_response);
        assert_eq!(result.map(|r| r.status()).ok(), Some(StatusCode::OK));
    }
}
