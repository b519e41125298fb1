/*
 * Responsibility
 * - users テーブル向け SQLx 操作 (CredentialStore の PostgreSQL 実装)
 * - PgPool を受け取り lookup / insert / update を提供
 * - DB エラーは RepoError に変換して返す (23505 は Conflict)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::credential_store::{CredentialStore, PrincipalRecord};
use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for PrincipalRecord {
    type Error = RepoError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| RepoError::Corrupt(format!("user {}: {e}", row.id)))?;

        Ok(PrincipalRecord {
            id: row.id,
            identifier: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role,
            enabled: row.enabled,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_identifier(&self, identifier: &str) -> RepoResult<Option<PrincipalRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, role, enabled, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PrincipalRecord::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<PrincipalRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, role, enabled, created_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PrincipalRecord::try_from).transpose()
    }

    async fn save(&self, record: PrincipalRecord) -> RepoResult<PrincipalRecord> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, enabled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, email, password_hash, role, enabled, created_at
            "#,
        )
        .bind(record.id)
        .bind(&record.identifier)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.role.as_str())
        .bind(record.enabled)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        PrincipalRecord::try_from(row)
    }

    async fn update(&self, record: PrincipalRecord) -> RepoResult<Option<PrincipalRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                email = $2,
                password_hash = $3,
                role = $4,
                enabled = $5
            WHERE id = $1
            RETURNING id, username, email, password_hash, role, enabled, created_at
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.role.as_str())
        .bind(record.enabled)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        row.map(PrincipalRecord::try_from).transpose()
    }

    async fn list(&self) -> RepoResult<Vec<PrincipalRecord>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, role, enabled, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PrincipalRecord::try_from).collect()
    }
}
