//! One-way, salted password hashing (Argon2id, PHC string format).
//!
//! Both functions are CPU-heavy on purpose; async callers should run them
//! through `tokio::task::spawn_blocking`.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::services::auth::error::{AuthError, AuthResult};

pub fn hash_password(plaintext: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Hash verified against when the account does not exist, so the lookup miss
/// costs the same as a wrong password.
static UNKNOWN_ACCOUNT_HASH: LazyLock<String> = LazyLock::new(|| {
    hash_password("unknown-account-placeholder").unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to prepare placeholder password hash");
        String::new()
    })
});

/// Blocking: runs one full verification against a placeholder hash. The result is discarded.
pub fn verify_unknown_account(plaintext: &str) {
    let _ = verify_password(plaintext, &UNKNOWN_ACCOUNT_HASH);
}

/// Returns `false` for a mismatch and for a stored hash that cannot be parsed.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}
