//! Auth configuration and shared request state.

use std::sync::Arc;

use crate::api::email::EmailSender;
use crate::otp::OtpService;
use crate::store::CredentialStore;
use crate::token::TokenService;

const DEFAULT_RESET_TTL_SECONDS: i64 = 10 * 60;
const DEFAULT_MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    reset_ttl_seconds: i64,
    min_password_len: usize,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            reset_ttl_seconds: DEFAULT_RESET_TTL_SECONDS,
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
        }
    }

    #[must_use]
    pub fn with_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_min_password_len(mut self, len: usize) -> Self {
        self.min_password_len = len;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn reset_ttl_seconds(&self) -> i64 {
        self.reset_ttl_seconds
    }

    pub(super) fn min_password_len(&self) -> usize {
        self.min_password_len
    }
}

/// Everything the auth handlers need, injected once at startup.
pub struct AuthState {
    config: AuthConfig,
    store: Arc<dyn CredentialStore>,
    mailer: Arc<dyn EmailSender>,
    tokens: TokenService,
    otp: OtpService,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn EmailSender>,
        tokens: TokenService,
        otp: OtpService,
    ) -> Self {
        Self {
            config,
            store,
            mailer,
            tokens,
            otp,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn EmailSender {
        self.mailer.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub fn otp(&self) -> &OtpService {
        &self.otp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_overrides() {
        let config = AuthConfig::new("https://aula.dev".to_string());
        assert_eq!(config.frontend_base_url(), "https://aula.dev");
        assert_eq!(config.reset_ttl_seconds(), DEFAULT_RESET_TTL_SECONDS);
        assert_eq!(config.min_password_len(), DEFAULT_MIN_PASSWORD_LEN);

        let config = config.with_reset_ttl_seconds(30).with_min_password_len(12);
        assert_eq!(config.reset_ttl_seconds(), 30);
        assert_eq!(config.min_password_len(), 12);
    }
}
