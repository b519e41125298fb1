/*
 * Responsibility
 * - /auth/login, /auth/register, /auth/validate, /auth/logout
 * - いずれも Public route (access filter は token を見ない)。validate/logout は自分で Bearer を読む
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{
    api::v1::{
        dto::{
            auth::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest, ValidateResponse},
            users::PrincipalResponse,
        },
        extractors::bearer_token,
    },
    error::AppError,
    services::auth::AuthError,
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload?;

    let outcome = state.auth.authenticate(&req.identifier, &req.password).await?;

    Ok(Json(outcome.into()))
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<PrincipalResponse>, AppError> {
    let Json(req) = payload?;

    let principal = state
        .auth
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok(Json(principal.into()))
}

pub async fn validate(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return invalid("missing bearer token");
    };

    match state.auth.validate(token).await {
        Ok(v) => Json(ValidateResponse::valid(
            v.principal.identifier,
            v.principal.role,
            v.expires_at,
        ))
        .into_response(),
        Err(e @ (AuthError::TokenInvalid | AuthError::TokenExpired | AuthError::AccountDisabled)) => {
            invalid(e.to_string())
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

fn invalid(error: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ValidateResponse::invalid(error))).into_response()
}

/// Stateless: the token stays valid until it expires. Only logged.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<MessageResponse> {
    match bearer_token(&headers).map(|t| state.auth.codec().decode(t)) {
        Some(Ok(claims)) => tracing::info!(
            identifier = %claims.subject,
            jti = %claims.jti,
            issued_at = %claims.issued_at,
            "logout (token remains valid until expiry)"
        ),
        Some(Err(e)) => tracing::debug!(error = %e, "logout with unusable token"),
        None => tracing::debug!("logout without token"),
    }

    Json(MessageResponse::new("logged out"))
}
