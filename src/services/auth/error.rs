use thiserror::Error;

use crate::repos::error::RepoError;

/// Failures of the authentication core.
///
/// Every variant is scoped to a single request; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("{field} is already in use")]
    DuplicateIdentifier { field: &'static str },

    #[error("invalid token")]
    TokenInvalid,

    #[error("token has expired")]
    TokenExpired,

    #[error("access denied")]
    AccessDenied,

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("{0}")]
    Validation(String),

    #[error("credential store failure")]
    Store(#[from] RepoError),

    #[error("password hashing failure: {0}")]
    Hashing(String),

    #[error("token signing failure: {0}")]
    Signing(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Token-level rejections the request filter swallows (request continues anonymously).
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::TokenInvalid | AuthError::TokenExpired | AuthError::AccountDisabled
        )
    }
}
