//! Credential store: account records and the persistence seam.
//!
//! Handlers only ever talk to [`CredentialStore`]; the Postgres backend is
//! used in production and the in-memory backend in tests and local runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Which record family an account belongs to. Lookups are always keyed by
/// `(role, email)`; the same email may exist once per role.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Student
    }
}

#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    otp_secret: Option<String>,
    otp_expires_unix: Option<i64>,
    reset_token_hash: Option<Vec<u8>>,
    reset_expires_unix: Option<i64>,
}

/// Current wall clock as unix seconds.
#[must_use]
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(0))
}

impl Account {
    /// A fresh, unverified account. The caller supplies an already-hashed
    /// password; plaintext never reaches the store.
    #[must_use]
    pub fn new(role: Role, name: String, email: String, mobile: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            mobile,
            password_hash,
            role,
            is_verified: false,
            otp_secret: None,
            otp_expires_unix: None,
            reset_token_hash: None,
            reset_expires_unix: None,
        }
    }

    /// Set the OTP pair. Secret and expiry are only ever written together.
    pub fn set_otp_challenge(&mut self, secret: String, expires_unix: i64) {
        self.otp_secret = Some(secret);
        self.otp_expires_unix = Some(expires_unix);
    }

    /// Returns `(secret, expires_unix)` while a verification challenge is outstanding.
    #[must_use]
    pub fn otp_challenge(&self) -> Option<(&str, i64)> {
        match (self.otp_secret.as_deref(), self.otp_expires_unix) {
            (Some(secret), Some(expires)) => Some((secret, expires)),
            _ => None,
        }
    }

    /// Consume the OTP pair and mark the account verified. Verification is
    /// monotonic; this is the only place `is_verified` flips.
    pub fn mark_verified(&mut self) {
        self.is_verified = true;
        self.otp_secret = None;
        self.otp_expires_unix = None;
    }

    /// Set the reset pair. Only the token hash is stored, never the raw token.
    pub fn set_reset_challenge(&mut self, token_hash: Vec<u8>, expires_unix: i64) {
        self.reset_token_hash = Some(token_hash);
        self.reset_expires_unix = Some(expires_unix);
    }

    #[must_use]
    pub fn reset_challenge(&self) -> Option<(&[u8], i64)> {
        match (self.reset_token_hash.as_deref(), self.reset_expires_unix) {
            (Some(hash), Some(expires)) => Some((hash, expires)),
            _ => None,
        }
    }

    /// Replace the password hash and clear the reset pair.
    pub fn complete_reset(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.reset_token_hash = None;
        self.reset_expires_unix = None;
    }

    pub(crate) fn from_parts(
        id: Uuid,
        name: String,
        email: String,
        mobile: String,
        password_hash: String,
        role: Role,
        is_verified: bool,
        otp_secret: Option<String>,
        otp_expires_unix: Option<i64>,
        reset_token_hash: Option<Vec<u8>>,
        reset_expires_unix: Option<i64>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            mobile,
            password_hash,
            role,
            is_verified,
            otp_secret,
            otp_expires_unix,
            reset_token_hash,
            reset_expires_unix,
        }
    }

    pub(crate) fn otp_secret(&self) -> Option<&str> {
        self.otp_secret.as_deref()
    }

    pub(crate) fn otp_expires_unix(&self) -> Option<i64> {
        self.otp_expires_unix
    }

    pub(crate) fn reset_token_hash(&self) -> Option<&[u8]> {
        self.reset_token_hash.as_deref()
    }

    pub(crate) fn reset_expires_unix(&self) -> Option<i64> {
        self.reset_expires_unix
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// The `(role, email)` pair already exists. The store-level uniqueness
    /// constraint is the final arbiter for racing registrations.
    #[error("email already registered")]
    DuplicateEmail,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, role: Role, email: &str) -> Result<Option<Account>, StoreError>;

    /// Persist a new account. Fails with [`StoreError::DuplicateEmail`] when
    /// the `(role, email)` pair is taken.
    async fn create(&self, account: Account) -> Result<Account, StoreError>;

    /// Persist mutated fields of an existing account, keyed by `(role, id)`.
    async fn save(&self, account: &Account) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::new(
            Role::Student,
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "5551234567".to_string(),
            "$argon2id$fake".to_string(),
        )
    }

    #[test]
    fn new_account_is_unverified_with_no_pending_state() {
        let account = account();
        assert!(!account.is_verified);
        assert!(account.otp_challenge().is_none());
        assert!(account.reset_challenge().is_none());
    }

    #[test]
    fn otp_pair_is_set_and_cleared_together() {
        let mut account = account();
        account.set_otp_challenge("SECRET".to_string(), 1000);
        assert_eq!(account.otp_challenge(), Some(("SECRET", 1000)));

        account.mark_verified();
        assert!(account.is_verified);
        assert!(account.otp_challenge().is_none());
        assert!(account.otp_secret().is_none());
        assert!(account.otp_expires_unix().is_none());
    }

    #[test]
    fn reset_pair_is_cleared_on_completion() {
        let mut account = account();
        account.set_reset_challenge(vec![1, 2, 3], 2000);
        assert_eq!(account.reset_challenge(), Some((&[1u8, 2, 3][..], 2000)));

        account.complete_reset("$argon2id$new".to_string());
        assert_eq!(account.password_hash, "$argon2id$new");
        assert!(account.reset_challenge().is_none());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Teacher).ok().as_deref(), Some("\"teacher\""));
        assert_eq!(Role::default(), Role::Student);
        assert_eq!(Role::Student.as_str(), "student");
    }

    #[test]
    fn now_unix_is_positive() {
        assert!(now_unix() > 0);
    }
}
