//! Auth orchestration: one module per workflow of the
//! signup → verify → login → reset protocol.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod errors;
mod guard;
pub(crate) mod login;
pub(crate) mod password;
pub(crate) mod register;
pub(crate) mod session;
pub mod state;
pub mod types;
mod utils;
pub(crate) mod verify;

pub use state::{AuthConfig, AuthState};

/// All auth routes, including the guarded echo route. Expects
/// `Extension<Arc<AuthState>>` to be layered by the caller.
pub fn routes() -> Router {
    let protected = Router::new()
        .route("/api/protected", get(session::protected))
        .route_layer(middleware::from_fn(guard::require_auth));

    Router::new()
        .route("/api/auth/register", post(register::register))
        .route("/api/auth/verify-otp", post(verify::verify_otp))
        .route("/api/auth/login", post(login::login))
        .route(
            "/api/auth/request-password-reset",
            post(password::request_password_reset),
        )
        .route("/api/auth/reset-password", post(password::reset_password))
        .route("/api/auth/logout", post(session::logout))
        .merge(protected)
}

#[cfg(test)]
pub(super) mod testing {
    //! Shared fixtures for handler tests: memory store, mock mailer, and
    //! directly seeded accounts.

    use std::sync::Arc;

    use super::state::{AuthConfig, AuthState};
    use super::types::{LoginRequest, RegisterRequest, ResetPasswordRequest, VerifyOtpRequest};
    use crate::api::email::MockEmailSender;
    use crate::otp::OtpService;
    use crate::password;
    use crate::store::{now_unix, Account, CredentialStore, MemoryCredentialStore, Role};
    use crate::token::TokenService;
    use anyhow::Result;

    pub(crate) const TEST_PASSWORD: &str = "Secret123!";

    fn build_state(
        mailer: Arc<MockEmailSender>,
    ) -> (Arc<AuthState>, Arc<MemoryCredentialStore>, Arc<MockEmailSender>) {
        let store = Arc::new(MemoryCredentialStore::new());
        let state = Arc::new(AuthState::new(
            AuthConfig::new("https://aula.dev".to_string()),
            store.clone(),
            mailer.clone(),
            TokenService::new(b"test-secret"),
            OtpService::new(),
        ));
        (state, store, mailer)
    }

    pub(crate) fn test_state() -> (Arc<AuthState>, Arc<MemoryCredentialStore>, Arc<MockEmailSender>)
    {
        build_state(Arc::new(MockEmailSender::new()))
    }

    pub(crate) fn test_state_with_failing_mailer(
    ) -> (Arc<AuthState>, Arc<MemoryCredentialStore>, Arc<MockEmailSender>) {
        build_state(Arc::new(MockEmailSender::failing()))
    }

    pub(crate) fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice".to_string(),
            email: email.to_string(),
            mobile: "5551234567".to_string(),
            password: TEST_PASSWORD.to_string(),
            role: Role::Student,
        }
    }

    pub(crate) fn verify_request(email: &str, otp: &str) -> VerifyOtpRequest {
        VerifyOtpRequest {
            email: email.to_string(),
            otp: otp.to_string(),
            role: Role::Student,
        }
    }

    pub(crate) fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Student,
        }
    }

    pub(crate) fn reset_request(email: &str, token: &str, new_password: &str) -> ResetPasswordRequest {
        ResetPasswordRequest {
            email: email.to_string(),
            token: token.to_string(),
            new_password: new_password.to_string(),
            role: Role::Student,
        }
    }

    /// Seed an unverified account with a pending OTP challenge, bypassing the
    /// register handler (and therefore the mailer). Returns the current code.
    pub(crate) async fn registered_account(state: &Arc<AuthState>, email: &str) -> Result<String> {
        let mut account = Account::new(
            Role::Student,
            "Alice".to_string(),
            email.to_string(),
            "5551234567".to_string(),
            password::hash(TEST_PASSWORD)?,
        );
        let (secret, code) = state.otp().issue()?;
        let otp_ttl = i64::try_from(state.otp().step_seconds()).unwrap_or(600);
        account.set_otp_challenge(secret, now_unix() + otp_ttl);
        state.store().create(account).await?;
        Ok(code)
    }

    /// Seed an already-verified account with the standard test password.
    pub(crate) async fn verified_account(state: &Arc<AuthState>, email: &str) -> Result<()> {
        let mut account = Account::new(
            Role::Student,
            "Alice".to_string(),
            email.to_string(),
            "5551234567".to_string(),
            password::hash(TEST_PASSWORD)?,
        );
        account.mark_verified();
        state.store().create(account).await?;
        Ok(())
    }
}
