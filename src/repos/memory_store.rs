use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::repos::credential_store::{CredentialStore, PrincipalRecord};
use crate::repos::error::{RepoError, RepoResult};

/// Process-local `CredentialStore`, used when no `DATABASE_URL` is configured and in tests.
///
/// Uniqueness rules match the `users` table: username exact, email case-insensitive.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<Vec<PrincipalRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_identifier(&self, identifier: &str) -> RepoResult<Option<PrincipalRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.identifier == identifier).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<PrincipalRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| same_email(&r.email, email))
            .cloned())
    }

    async fn save(&self, record: PrincipalRecord) -> RepoResult<PrincipalRecord> {
        let mut records = self.records.write().await;

        if records.iter().any(|r| r.identifier == record.identifier) {
            return Err(RepoError::Conflict("username"));
        }
        if records
            .iter()
            .any(|r| same_email(&r.email, &record.email))
        {
            return Err(RepoError::Conflict("email"));
        }

        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: PrincipalRecord) -> RepoResult<Option<PrincipalRecord>> {
        let mut records = self.records.write().await;

        if records
            .iter()
            .any(|r| r.id != record.id && same_email(&r.email, &record.email))
        {
            return Err(RepoError::Conflict("email"));
        }

        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                // username and created_at are immutable, as in the SQL UPDATE
                existing.email = record.email;
                existing.password_hash = record.password_hash;
                existing.role = record.role;
                existing.enabled = record.enabled;
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> RepoResult<Vec<PrincipalRecord>> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

/// Same comparison as the `lower(email)` unique index.
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::role::Role;

    fn record(identifier: &str, email: &str) -> PrincipalRecord {
        PrincipalRecord::new(identifier, email, "hash".to_string(), Role::User)
    }

    #[tokio::test]
    async fn save_then_find_by_identifier_and_email() {
        let store = InMemoryCredentialStore::new();
        store.save(record("alice", "alice@example.com")).await.unwrap();

        let by_name = store.find_by_identifier("alice").await.unwrap().unwrap();
        assert_eq!(by_name.email, "alice@example.com");

        let by_email = store
            .find_by_email("ALICE@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.identifier, "alice");

        assert!(store.find_by_identifier("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_rejects_duplicates_without_mutation() {
        let store = InMemoryCredentialStore::new();
        store.save(record("alice", "alice@example.com")).await.unwrap();

        let dup_name = store.save(record("alice", "other@example.com")).await;
        assert!(matches!(dup_name, Err(RepoError::Conflict("username"))));

        let dup_email = store.save(record("bob", "Alice@Example.com")).await;
        assert!(matches!(dup_email, Err(RepoError::Conflict("email"))));

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn email_comparison_folds_non_ascii_case() {
        let store = InMemoryCredentialStore::new();
        store.save(record("elodie", "élodie@exemple.fr")).await.unwrap();

        let found = store.find_by_email("ÉLODIE@EXEMPLE.FR").await.unwrap();
        assert_eq!(found.map(|r| r.identifier).as_deref(), Some("elodie"));

        let dup = store.save(record("elodie2", "Élodie@exemple.fr")).await;
        assert!(matches!(dup, Err(RepoError::Conflict("email"))));
    }

    #[tokio::test]
    async fn update_replaces_mutable_fields_only() {
        let store = InMemoryCredentialStore::new();
        let saved = store.save(record("alice", "alice@example.com")).await.unwrap();

        let mut changed = saved.clone();
        changed.identifier = "renamed".to_string();
        changed.enabled = false;
        changed.role = Role::Porteur;

        let updated = store.update(changed).await.unwrap().unwrap();
        assert_eq!(updated.identifier, "alice");
        assert!(!updated.enabled);
        assert_eq!(updated.role, Role::Porteur);

        let missing = store.update(record("ghost", "ghost@example.com")).await.unwrap();
        assert!(missing.is_none());
    }
}
