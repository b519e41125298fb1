/*
 * Responsibility
 * - 認証コアから見た CredentialStore の境界 (trait)
 * - Principal / PrincipalRecord の型
 * - 実装は user_repo (PostgreSQL) と memory_store (in-memory)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::repos::error::RepoResult;
use crate::services::auth::password;
use crate::services::auth::role::Role;

/// A registered account as the rest of the application sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    /// Login name; also the token subject.
    pub identifier: String,
    pub email: String,
    pub role: Role,
    pub enabled: bool,
}

/// Stored form of a principal, including the password hash.
#[derive(Clone)]
pub struct PrincipalRecord {
    pub id: Uuid,
    pub identifier: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl PrincipalRecord {
    pub fn new(identifier: &str, email: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            identifier: identifier.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            identifier: self.identifier.clone(),
            email: self.email.clone(),
            role: self.role,
            enabled: self.enabled,
        }
    }
}

impl std::fmt::Debug for PrincipalRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the password hash
        f.debug_struct("PrincipalRecord")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Owner of principal records and password hashes.
///
/// Implementations must be safe for concurrent reads; the auth core holds no
/// mutable state of its own.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    async fn find_by_identifier(&self, identifier: &str) -> RepoResult<Option<PrincipalRecord>>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<PrincipalRecord>>;

    /// Insert a new record. Returns `RepoError::Conflict` when identifier or email is taken.
    async fn save(&self, record: PrincipalRecord) -> RepoResult<PrincipalRecord>;

    /// Replace an existing record (matched by id). `Ok(None)` when it does not exist.
    async fn update(&self, record: PrincipalRecord) -> RepoResult<Option<PrincipalRecord>>;

    async fn list(&self) -> RepoResult<Vec<PrincipalRecord>>;

    /// Blocking: argon2 verification. Run it off the async executor.
    fn verify_password(&self, record: &PrincipalRecord, plaintext: &str) -> bool {
        password::verify_password(plaintext, &record.password_hash)
    }
}
