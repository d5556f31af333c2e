//! In-memory credential store used by tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{Account, CredentialStore, Role, StoreError};

/// Map-backed store keyed by `(role, email)`. The map itself enforces the
/// same uniqueness the Postgres index does.
#[derive(Default)]
pub struct MemoryCredentialStore {
    accounts: Mutex<HashMap<(Role, String), Account>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, role: Role, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.lock().await;
        Ok(accounts.get(&(role, email.to_string())).cloned())
    }

    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.lock().await;
        let key = (account.role, account.email.clone());
        if accounts.contains_key(&key) {
            return Err(StoreError::DuplicateEmail);
        }
        accounts.insert(key, account.clone());
        Ok(account)
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.lock().await;
        let key = (account.role, account.email.clone());
        accounts.insert(key, account.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn account(role: Role, email: &str) -> Account {
        Account::new(
            role,
            "Alice".to_string(),
            email.to_string(),
            "5551234567".to_string(),
            "$argon2id$fake".to_string(),
        )
    }

    #[tokio::test]
    async fn create_then_find_round_trips() -> Result<()> {
        let store = MemoryCredentialStore::new();
        store.create(account(Role::Student, "a@example.com")).await?;

        let found = store.find_by_email(Role::Student, "a@example.com").await?;
        assert_eq!(found.map(|account| account.email), Some("a@example.com".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_same_role_is_rejected() -> Result<()> {
        let store = MemoryCredentialStore::new();
        store.create(account(Role::Student, "a@example.com")).await?;

        let second = store.create(account(Role::Student, "a@example.com")).await;
        assert!(matches!(second, Err(StoreError::DuplicateEmail)));
        Ok(())
    }

    #[tokio::test]
    async fn same_email_different_role_is_allowed() -> Result<()> {
        let store = MemoryCredentialStore::new();
        store.create(account(Role::Student, "a@example.com")).await?;
        store.create(account(Role::Teacher, "a@example.com")).await?;

        assert!(store.find_by_email(Role::Teacher, "a@example.com").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn save_persists_mutations() -> Result<()> {
        let store = MemoryCredentialStore::new();
        let mut created = store.create(account(Role::Student, "a@example.com")).await?;

        created.set_otp_challenge("SECRET".to_string(), 99);
        store.save(&created).await?;

        let reloaded = store
            .find_by_email(Role::Student, "a@example.com")
            .await?
            .and_then(|account| account.otp_challenge().map(|(secret, exp)| (secret.to_string(), exp)));
        assert_eq!(reloaded, Some(("SECRET".to_string(), 99)));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_is_none() -> Result<()> {
        let store = MemoryCredentialStore::new();
        assert!(store.find_by_email(Role::Student, "nobody@example.com").await?.is_none());
        Ok(())
    }
}
