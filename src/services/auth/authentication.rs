use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::repos::credential_store::{CredentialStore, Principal, PrincipalRecord};
use crate::repos::error::RepoError;
use crate::services::auth::error::{AuthError, AuthResult};
use crate::services::auth::password;
use crate::services::auth::role::Role;
use crate::services::auth::token_codec::{IssuedToken, TokenCodec};

pub const MIN_PASSWORD_LEN: usize = 6;
const MAX_IDENTIFIER_LEN: usize = 50;

/// Successful `authenticate` result: the token plus the principal for response shaping.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: IssuedToken,
    pub principal: Principal,
}

/// Successful `validate` result.
///
/// `principal.role` is the role currently stored, which may differ from the role
/// embedded in the token if it changed after issuance.
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    pub principal: Principal,
    pub expires_at: DateTime<Utc>,
}

/// Credential checks, token issuance and token validation.
///
/// Holds no mutable state: the store is the only shared collaborator.
#[derive(Clone)]
pub struct AuthenticationService {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    token_ttl: Duration,
    default_role: Role,
}

impl std::fmt::Debug for AuthenticationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationService")
            .field("codec", &self.codec)
            .field("token_ttl", &self.token_ttl)
            .field("default_role", &self.default_role)
            .finish()
    }
}

impl AuthenticationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: TokenCodec,
        token_ttl: Duration,
        default_role: Role,
    ) -> Self {
        Self {
            store,
            codec,
            token_ttl,
            default_role,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn default_role(&self) -> Role {
        self.default_role
    }

    /// Check `identifier` (username) + `password` and issue a token.
    ///
    /// Password is verified before the enabled flag, so a disabled account only
    /// reports `AccountDisabled` to a caller who knows its password. An unknown
    /// identifier still pays for one argon2 verification.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> AuthResult<LoginOutcome> {
        let Some(record) = self.store.find_by_identifier(identifier.trim()).await? else {
            debug!(identifier, "login for unknown identifier");
            self.verify_unknown(password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(&record, password).await? {
            debug!(identifier = %record.identifier, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !record.enabled {
            warn!(identifier = %record.identifier, "login attempt on disabled account");
            return Err(AuthError::AccountDisabled);
        }

        let token = self
            .codec
            .issue(&record.identifier, record.role, self.token_ttl)?;

        info!(
            identifier = %record.identifier,
            role = %record.role,
            expires_at = %token.expires_at,
            "login succeeded"
        );

        Ok(LoginOutcome {
            token,
            principal: record.principal(),
        })
    }

    /// Create an account with the configured default role. Does not issue a token.
    pub async fn register(
        &self,
        identifier: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<Principal> {
        self.register_with_role(identifier, email, password, self.default_role)
            .await
    }

    pub async fn register_with_role(
        &self,
        identifier: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> AuthResult<Principal> {
        let identifier = identifier.trim();
        let email = email.trim();
        validate_identifier(identifier)?;
        validate_email(email)?;
        validate_password(password)?;

        if self.store.find_by_identifier(identifier).await?.is_some() {
            return Err(AuthError::DuplicateIdentifier { field: "username" });
        }
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateIdentifier { field: "email" });
        }

        let password_hash = self.hash(password).await?;
        let record = PrincipalRecord::new(identifier, email, password_hash, role);

        // A concurrent registration can still win the race between lookup and insert.
        let saved = self.store.save(record).await.map_err(|e| match e {
            RepoError::Conflict(field) => AuthError::DuplicateIdentifier { field },
            other => AuthError::Store(other),
        })?;

        info!(identifier = %saved.identifier, role = %saved.role, "principal registered");

        Ok(saved.principal())
    }

    pub async fn validate(&self, token: &str) -> AuthResult<ValidatedToken> {
        self.validate_at(token, Utc::now()).await
    }

    /// Decode `token` and re-fetch its subject so disablement after issuance is honoured.
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<ValidatedToken> {
        let claims = self.codec.decode_at(token, now)?;

        let record = self
            .store
            .find_by_identifier(&claims.subject)
            .await?
            .ok_or_else(|| {
                debug!(subject = %claims.subject, "token subject no longer exists");
                AuthError::TokenInvalid
            })?;

        if !record.enabled {
            return Err(AuthError::AccountDisabled);
        }

        if record.role != claims.role {
            debug!(
                subject = %claims.subject,
                token_role = %claims.role,
                current_role = %record.role,
                "role changed since token issuance"
            );
        }

        Ok(ValidatedToken {
            principal: record.principal(),
            expires_at: claims.expires_at,
        })
    }

    pub async fn change_password(
        &self,
        identifier: &str,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        validate_password(new_password)?;
        if current_password == new_password {
            return Err(AuthError::validation(
                "new password must be different from the current password",
            ));
        }

        let mut record = self.find_record(identifier).await?;
        if !self.verify(&record, current_password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        record.password_hash = self.hash(new_password).await?;
        self.store
            .update(record)
            .await?
            .ok_or(AuthError::NotFound { resource: "user" })?;

        info!(identifier, "password changed");
        Ok(())
    }

    pub async fn set_enabled(&self, identifier: &str, enabled: bool) -> AuthResult<Principal> {
        let mut record = self.find_record(identifier).await?;
        record.enabled = enabled;
        let updated = self
            .store
            .update(record)
            .await?
            .ok_or(AuthError::NotFound { resource: "user" })?;

        info!(identifier, enabled, "account status changed");
        Ok(updated.principal())
    }

    pub async fn set_role(&self, identifier: &str, role: Role) -> AuthResult<Principal> {
        let mut record = self.find_record(identifier).await?;
        record.role = role;
        let updated = self
            .store
            .update(record)
            .await?
            .ok_or(AuthError::NotFound { resource: "user" })?;

        info!(identifier, role = %role, "role changed");
        Ok(updated.principal())
    }

    pub async fn find_principal(&self, identifier: &str) -> AuthResult<Principal> {
        Ok(self.find_record(identifier).await?.principal())
    }

    pub async fn list_principals(&self) -> AuthResult<Vec<Principal>> {
        let records = self.store.list().await?;
        Ok(records.iter().map(PrincipalRecord::principal).collect())
    }

    async fn find_record(&self, identifier: &str) -> AuthResult<PrincipalRecord> {
        self.store
            .find_by_identifier(identifier)
            .await?
            .ok_or(AuthError::NotFound { resource: "user" })
    }

    async fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || password::hash_password(&plaintext))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_unknown(&self, plaintext: &str) -> AuthResult<()> {
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || password::verify_unknown_account(&plaintext))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    async fn verify(&self, record: &PrincipalRecord, plaintext: &str) -> AuthResult<bool> {
        let store = Arc::clone(&self.store);
        let record = record.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || store.verify_password(&record, &plaintext))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

fn validate_identifier(identifier: &str) -> AuthResult<()> {
    if identifier.is_empty() {
        return Err(AuthError::validation("username is required"));
    }
    if identifier.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(AuthError::validation(format!(
            "username must be <= {MAX_IDENTIFIER_LEN} chars"
        )));
    }
    if identifier.chars().any(char::is_whitespace) {
        return Err(AuthError::validation("username must not contain whitespace"));
    }
    Ok(())
}

fn validate_email(email: &str) -> AuthResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AuthError::validation("email is invalid")),
    }
}

fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::memory_store::InMemoryCredentialStore;

    const SECRET: &[u8] = b"test-secret-key-that-is-long-enough-for-testing";

    fn service_with(store: Arc<InMemoryCredentialStore>) -> AuthenticationService {
        let codec = TokenCodec::new(SECRET, "regioninvest").unwrap();
        AuthenticationService::new(store, codec, Duration::hours(1), Role::User)
    }

    async fn seeded() -> (AuthenticationService, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let service = service_with(store.clone());
        service
            .register_with_role("admin", "admin@example.com", "admin123", Role::Admin)
            .await
            .unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn authenticate_issues_token_for_stored_principal() {
        let (service, _) = seeded().await;

        let outcome = service.authenticate("admin", "admin123").await.unwrap();
        assert_eq!(outcome.principal.role, Role::Admin);

        let claims = service.codec().decode(&outcome.token.token).unwrap();
        assert_eq!(claims.subject, "admin");
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn authenticate_rejects_unknown_user_and_wrong_password() {
        let (service, _) = seeded().await;

        assert!(matches!(
            service.authenticate("nobody", "admin123").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.authenticate("admin", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn unknown_identifier_costs_a_password_verification() {
        let (service, _) = seeded().await;
        // warm the placeholder hash
        let _ = service.authenticate("nobody", "admin123").await;

        let started = std::time::Instant::now();
        for _ in 0..3 {
            let _ = service.authenticate("admin", "wrong-password").await;
        }
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        for _ in 0..3 {
            let _ = service.authenticate("nobody", "wrong-password").await;
        }
        let unknown = started.elapsed();

        assert!(
            unknown * 10 >= wrong_password,
            "unknown={unknown:?} wrong_password={wrong_password:?}"
        );
    }

    #[tokio::test]
    async fn authenticate_rejects_disabled_account() {
        let (service, _) = seeded().await;
        service.set_enabled("admin", false).await.unwrap();

        assert!(matches!(
            service.authenticate("admin", "admin123").await,
            Err(AuthError::AccountDisabled)
        ));
        // The wrong password still reads as bad credentials.
        assert!(matches!(
            service.authenticate("admin", "nope-nope").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn register_assigns_default_role_and_does_not_login() {
        let (service, _) = seeded().await;

        let principal = service
            .register("alice", "alice@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(principal.identifier, "alice");
        assert_eq!(principal.role, Role::User);
        assert!(principal.enabled);

        let outcome = service.authenticate("alice", "secret1").await.unwrap();
        assert_eq!(outcome.principal.id, principal.id);
    }

    #[tokio::test]
    async fn register_duplicate_fails_without_mutating_store() {
        let (service, store) = seeded().await;
        let before = store.len().await;

        let by_name = service
            .register("admin", "fresh@example.com", "secret1")
            .await;
        assert!(matches!(
            by_name,
            Err(AuthError::DuplicateIdentifier { field: "username" })
        ));

        let by_email = service
            .register("fresh", "ADMIN@example.com", "secret1")
            .await;
        assert!(matches!(
            by_email,
            Err(AuthError::DuplicateIdentifier { field: "email" })
        ));

        assert_eq!(store.len().await, before);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (service, store) = seeded().await;

        for (name, email, pw) in [
            ("", "a@example.com", "secret1"),
            ("has space", "a@example.com", "secret1"),
            ("bob", "not-an-email", "secret1"),
            ("bob", "bob@example.com", "short"),
        ] {
            assert!(matches!(
                service.register(name, email, pw).await,
                Err(AuthError::Validation(_))
            ));
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn validate_returns_live_principal() {
        let (service, _) = seeded().await;
        let outcome = service.authenticate("admin", "admin123").await.unwrap();

        let validated = service.validate(&outcome.token.token).await.unwrap();
        assert_eq!(validated.principal.identifier, "admin");
        assert_eq!(validated.expires_at, outcome.token.expires_at);
    }

    #[tokio::test]
    async fn disabling_after_issue_invalidates_unexpired_token() {
        let (service, _) = seeded().await;
        let outcome = service.authenticate("admin", "admin123").await.unwrap();

        service.set_enabled("admin", false).await.unwrap();

        assert!(matches!(
            service.validate(&outcome.token.token).await,
            Err(AuthError::AccountDisabled)
        ));
    }

    #[tokio::test]
    async fn validate_uses_current_role_over_token_role() {
        let (service, _) = seeded().await;
        service
            .register("porteur1", "p1@example.com", "password123")
            .await
            .unwrap();
        let outcome = service.authenticate("porteur1", "password123").await.unwrap();
        assert_eq!(outcome.principal.role, Role::User);

        service.set_role("porteur1", Role::Porteur).await.unwrap();

        let validated = service.validate(&outcome.token.token).await.unwrap();
        assert_eq!(validated.principal.role, Role::Porteur);
    }

    #[tokio::test]
    async fn validate_after_expiry_fails() {
        let (service, _) = seeded().await;
        let outcome = service.authenticate("admin", "admin123").await.unwrap();

        let later = outcome.token.expires_at + Duration::seconds(1);
        assert!(matches!(
            service.validate_at(&outcome.token.token, later).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let (service, _) = seeded().await;

        assert!(matches!(
            service.change_password("admin", "wrong-one", "newpass1").await,
            Err(AuthError::InvalidCredentials)
        ));

        service
            .change_password("admin", "admin123", "newpass1")
            .await
            .unwrap();
        assert!(service.authenticate("admin", "admin123").await.is_err());
        assert!(service.authenticate("admin", "newpass1").await.is_ok());
    }

    #[tokio::test]
    async fn admin_operations_report_missing_user() {
        let (service, _) = seeded().await;

        assert!(matches!(
            service.set_enabled("ghost", false).await,
            Err(AuthError::NotFound { resource: "user" })
        ));
        assert!(matches!(
            service.find_principal("ghost").await,
            Err(AuthError::NotFound { .. })
        ));
        assert_eq!(service.list_principals().await.unwrap().len(), 1);
    }
}
