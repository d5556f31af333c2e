//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the account id and email, valid for a
//! fixed lifetime (one hour by default). Verification covers both signature
//! and expiry, with zero leeway so an expired token is rejected immediately.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::now_unix;

const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60;

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    /// Mint a token for a verified account.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue(&self, account_id: Uuid, email: &str) -> Result<String> {
        let now = now_unix();
        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };
        encode(&Header::default(), &claims, &self.encoding_key).context("failed to sign token")
    }

    /// Validate signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    /// Returns an error for a tampered, malformed, or expired token.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .context("invalid token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn issued_token_verifies_and_echoes_claims() -> Result<()> {
        let tokens = TokenService::new(b"test-secret");
        let id = Uuid::new_v4();
        let token = tokens.issue(id, "alice@example.com")?;

        let claims = tokens.verify(&token)?;
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
        Ok(())
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() -> Result<()> {
        let token = TokenService::new(b"one").issue(Uuid::new_v4(), "a@example.com")?;
        assert!(TokenService::new(b"two").verify(&token).is_err());
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<()> {
        let tokens = TokenService::new(b"test-secret").with_ttl_seconds(-10);
        let token = tokens.issue(Uuid::new_v4(), "a@example.com")?;
        assert!(tokens.verify(&token).is_err());
        Ok(())
    }

    #[test]
    fn garbage_token_is_rejected() {
        let tokens = TokenService::new(b"test-secret");
        assert!(tokens.verify("not-a-jwt").is_err());
    }
}
