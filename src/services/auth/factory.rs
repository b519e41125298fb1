//! Factory: build the credential store and `AuthenticationService` from application `Config`.
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::repos::credential_store::CredentialStore;
use crate::repos::memory_store::InMemoryCredentialStore;
use crate::repos::user_repo::PgCredentialStore;
use crate::services::auth::AuthenticationService;
use crate::services::auth::token_codec::TokenCodec;

/// PostgreSQL when `DATABASE_URL` is set (migrations applied), in-memory otherwise.
pub async fn build_credential_store(config: &Config) -> anyhow::Result<Arc<dyn CredentialStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; principals are kept in memory only");
        return Ok(Arc::new(InMemoryCredentialStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("connect to DATABASE_URL")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("run database migrations")?;

    tracing::info!("credential store: postgres");
    Ok(Arc::new(PgCredentialStore::new(pool)))
}

pub fn build_auth_service(
    config: &Config,
    store: Arc<dyn CredentialStore>,
) -> anyhow::Result<Arc<AuthenticationService>> {
    let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.jwt_issuer.clone())
        .context("build token codec")?;

    Ok(Arc::new(AuthenticationService::new(
        store,
        codec,
        config.token_ttl(),
        config.registration_default_role,
    )))
}
