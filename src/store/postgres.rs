//! Postgres credential store.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE accounts (
//!     id                 UUID PRIMARY KEY,
//!     role               TEXT NOT NULL,
//!     name               TEXT NOT NULL,
//!     email              TEXT NOT NULL,
//!     mobile             TEXT NOT NULL,
//!     password_hash      TEXT NOT NULL,
//!     is_verified        BOOLEAN NOT NULL DEFAULT FALSE,
//!     otp_secret         TEXT,
//!     otp_expires_unix   BIGINT,
//!     reset_token_hash   BYTEA,
//!     reset_expires_unix BIGINT,
//!     created_at         TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (role, email)
//! );
//! ```
//!
//! The unique index on `(role, email)` is the final arbiter when two
//! registrations race past the handler-level exists check.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{Account, CredentialStore, Role, StoreError};

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn role_from_column(value: &str) -> Result<Role, StoreError> {
    match value {
        "student" => Ok(Role::Student),
        "teacher" => Ok(Role::Teacher),
        other => Err(StoreError::Backend(anyhow!("unknown role in accounts table: {other}"))),
    }
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Result<Account, StoreError> {
    let role = role_from_column(row.get::<String, _>("role").as_str())?;
    Ok(Account::from_parts(
        row.get::<Uuid, _>("id"),
        row.get("name"),
        row.get("email"),
        row.get("mobile"),
        row.get("password_hash"),
        role,
        row.get("is_verified"),
        row.get("otp_secret"),
        row.get("otp_expires_unix"),
        row.get("reset_token_hash"),
        row.get("reset_expires_unix"),
    ))
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, role: Role, email: &str) -> Result<Option<Account>, StoreError> {
        let query = r"
            SELECT id, role, name, email, mobile, password_hash, is_verified,
                   otp_secret, otp_expires_unix, reset_token_hash, reset_expires_unix
            FROM accounts
            WHERE role = $1 AND email = $2
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(role.as_str())
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by email")?;

        row.map(|row| account_from_row(&row)).transpose()
    }

    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let query = r"
            INSERT INTO accounts
                (id, role, name, email, mobile, password_hash, is_verified,
                 otp_secret, otp_expires_unix, reset_token_hash, reset_expires_unix)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(account.id)
            .bind(account.role.as_str())
            .bind(&account.name)
            .bind(&account.email)
            .bind(&account.mobile)
            .bind(&account.password_hash)
            .bind(account.is_verified)
            .bind(account.otp_secret())
            .bind(account.otp_expires_unix())
            .bind(account.reset_token_hash())
            .bind(account.reset_expires_unix())
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(account),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEmail),
            Err(err) => Err(StoreError::Backend(
                anyhow::Error::new(err).context("failed to insert account"),
            )),
        }
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let query = r"
            UPDATE accounts
            SET password_hash = $3,
                is_verified = $4,
                otp_secret = $5,
                otp_expires_unix = $6,
                reset_token_hash = $7,
                reset_expires_unix = $8
            WHERE role = $1 AND id = $2
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(account.role.as_str())
            .bind(account.id)
            .bind(&account.password_hash)
            .bind(account.is_verified)
            .bind(account.otp_secret())
            .bind(account.otp_expires_unix())
            .bind(account.reset_token_hash())
            .bind(account.reset_expires_unix())
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update account")?;

        Ok(())
    }
}
