//! Anti-forgery tokens for state-changing requests.
//!
//! Clients fetch a token from `GET /api/csrf-token` and replay it in the
//! `x-csrf-token` header on every non-safe request. The middleware runs
//! before any handler logic; a missing or unknown token is rejected as a
//! tampered form.

use axum::{
    extract::{Extension, Request},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;
use utoipa::ToSchema;

use super::handlers::auth::errors::AuthError;

pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// In-process table of outstanding tokens with their issue times.
pub struct CsrfStore {
    tokens: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
}

impl CsrfStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl: DEFAULT_TOKEN_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Mint and remember a fresh token. Stale entries are pruned on the way.
    #[must_use]
    pub fn issue(&self) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes);

        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.retain(|_, issued| issued.elapsed() < self.ttl);
            tokens.insert(token.clone(), Instant::now());
        }
        token
    }

    /// True when the token was issued by this process and has not aged out.
    /// Tokens stay valid for reuse within their lifetime, like a per-session
    /// form secret.
    #[must_use]
    pub fn validate(&self, token: &str) -> bool {
        self.tokens
            .lock()
            .ok()
            .and_then(|tokens| tokens.get(token).map(|issued| issued.elapsed() < self.ttl))
            .unwrap_or(false)
    }
}

impl Default for CsrfStore {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

#[utoipa::path(
    get,
    path = "/api/csrf-token",
    responses(
        (status = 200, description = "Token for subsequent state-changing calls", body = CsrfTokenResponse)
    ),
    tag = "csrf"
)]
pub async fn csrf_token(store: Extension<Arc<CsrfStore>>) -> impl IntoResponse {
    Json(CsrfTokenResponse {
        csrf_token: store.issue(),
    })
}

/// Safe methods pass through; everything else must carry a known token.
pub async fn csrf_guard(
    store: Extension<Arc<CsrfStore>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let method = request.method();
    if matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(request).await);
    }

    let presented = request
        .headers()
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match presented {
        Some(token) if store.validate(token) => Ok(next.run(request).await),
        _ => {
            debug!(path = %request.uri().path(), "state-changing request without valid CSRF token");
            Err(AuthError::CsrfMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates() {
        let store = CsrfStore::new();
        let token = store.issue();
        assert!(store.validate(&token));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let store = CsrfStore::new();
        assert!(!store.validate("never-issued"));
    }

    #[test]
    fn tokens_are_reusable_within_ttl() {
        let store = CsrfStore::new();
        let token = store.issue();
        assert!(store.validate(&token));
        assert!(store.validate(&token));
    }

    #[test]
    fn expired_token_is_rejected() {
        let store = CsrfStore::new().with_ttl(Duration::from_secs(0));
        let token = store.issue();
        assert!(!store.validate(&token));
    }

    #[test]
    fn tokens_are_unique() {
        let store = CsrfStore::new();
        assert_ne!(store.issue(), store.issue());
    }
}
