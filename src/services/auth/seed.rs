//! Startup accounts: the administrator and, in development, demo project owners.
//!
//! Idempotent: an account whose username already exists is left untouched,
//! including its password.

use crate::config::SeedConfig;
use crate::services::auth::{AuthError, AuthenticationService, Role};

const DEMO_PASSWORD: &str = "password123";
const DEMO_PORTEURS: [(&str, &str); 2] = [
    ("porteur1", "porteur1@example.com"),
    ("porteur2", "porteur2@example.com"),
];

/// Returns the number of accounts created.
pub async fn seed_accounts(auth: &AuthenticationService, seed: &SeedConfig) -> usize {
    let mut created = 0;

    if let Some(password) = seed.admin_password.as_deref() {
        created += ensure_account(
            auth,
            &seed.admin_username,
            &seed.admin_email,
            password,
            Role::Admin,
        )
        .await as usize;
    } else {
        tracing::info!("no SEED_ADMIN_PASSWORD; administrator account not seeded");
    }

    if seed.demo_accounts {
        for (username, email) in DEMO_PORTEURS {
            created += ensure_account(auth, username, email, DEMO_PASSWORD, Role::Porteur).await
                as usize;
        }
    }

    created
}

async fn ensure_account(
    auth: &AuthenticationService,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> bool {
    match auth.find_principal(username).await {
        Ok(_) => return false,
        Err(AuthError::NotFound { .. }) => {}
        Err(e) => {
            tracing::warn!(username, error = %e, "seed lookup failed");
            return false;
        }
    }

    match auth.register_with_role(username, email, password, role).await {
        Ok(principal) => {
            tracing::info!(username, role = %principal.role, "seeded account");
            true
        }
        // One bad seed entry must not block startup.
        Err(e) => {
            tracing::warn!(username, error = %e, "seeding account failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::repos::memory_store::InMemoryCredentialStore;
    use crate::services::auth::token_codec::TokenCodec;

    fn service() -> AuthenticationService {
        let codec = TokenCodec::new(b"seed-test-secret-0123456789abcdef", "regioninvest").unwrap();
        AuthenticationService::new(
            Arc::new(InMemoryCredentialStore::new()),
            codec,
            Duration::hours(1),
            Role::User,
        )
    }

    fn seed_config(demo_accounts: bool) -> SeedConfig {
        SeedConfig {
            admin_username: "admin".to_string(),
            admin_email: "admin@regioninvest.local".to_string(),
            admin_password: Some("admin123".to_string()),
            demo_accounts,
        }
    }

    #[tokio::test]
    async fn seeds_admin_and_demo_porteurs_once() {
        let auth = service();
        let cfg = seed_config(true);

        assert_eq!(seed_accounts(&auth, &cfg).await, 3);
        assert_eq!(seed_accounts(&auth, &cfg).await, 0);

        let admin = auth.authenticate("admin", "admin123").await.unwrap();
        assert_eq!(admin.principal.role, Role::Admin);

        let porteur = auth.authenticate("porteur2", "password123").await.unwrap();
        assert_eq!(porteur.principal.role, Role::Porteur);
    }

    #[tokio::test]
    async fn existing_admin_password_is_kept() {
        let auth = service();
        seed_accounts(&auth, &seed_config(false)).await;
        auth.change_password("admin", "admin123", "rotated-pw")
            .await
            .unwrap();

        seed_accounts(&auth, &seed_config(false)).await;

        assert!(auth.authenticate("admin", "rotated-pw").await.is_ok());
    }

    #[tokio::test]
    async fn nothing_seeded_without_password_or_demo() {
        let auth = service();
        let cfg = SeedConfig {
            admin_password: None,
            ..seed_config(false)
        };

        assert_eq!(seed_accounts(&auth, &cfg).await, 0);
        assert!(auth.list_principals().await.unwrap().is_empty());
    }
}
