/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body `{error, code}`)
 * - AuthError / RepoError / JSON rejection を統一的に変換
 */
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("{code}: {message}")]
    Unauthorized { code: &'static str, message: String },
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    /// No (usable) credentials on a path that needs them.
    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            code: "UNAUTHORIZED",
            message: "authentication required".into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, error) = match self {
            AppError::BadRequest { code, message } => (code, message),
            AppError::Unauthorized { code, message } => (code, message),
            AppError::Forbidden => ("FORBIDDEN", "access denied".into()),
            AppError::NotFound { resource } => ("NOT_FOUND", format!("{resource} not found.")),
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "internal server error".into()),
        };

        (status, Json(ErrorResponse { error, code })).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                AppError::bad_request("INVALID_CREDENTIALS", e.to_string())
            }
            AuthError::AccountDisabled => AppError::bad_request("ACCOUNT_DISABLED", e.to_string()),
            AuthError::DuplicateIdentifier { .. } => {
                AppError::bad_request("DUPLICATE_IDENTIFIER", e.to_string())
            }
            AuthError::Validation(message) => AppError::bad_request("VALIDATION_ERROR", message),
            AuthError::TokenInvalid => AppError::Unauthorized {
                code: "TOKEN_INVALID",
                message: e.to_string(),
            },
            AuthError::TokenExpired => AppError::Unauthorized {
                code: "TOKEN_EXPIRED",
                message: e.to_string(),
            },
            AuthError::AccessDenied => AppError::Forbidden,
            AuthError::NotFound { resource } => AppError::not_found(resource),
            AuthError::Store(_) | AuthError::Hashing(_) | AuthError::Signing(_) => {
                tracing::error!(error = ?e, "auth infrastructure failure");
                AppError::Internal
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        AuthError::from(e).into()
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::bad_request("INVALID_REQUEST_BODY", e.body_text())
    }
}
