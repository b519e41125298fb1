/*
 * Responsibility
 * - /admin/users 系 handler (ADMIN のみ。route 単位の判定は AccessPolicy + guard)
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    api::v1::{
        dto::users::{PrincipalResponse, SetEnabledRequest, SetRoleRequest},
        extractors::CurrentPrincipal,
    },
    error::AppError,
    services::auth::{AuthError, Role, role::UnknownRole},
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<PrincipalResponse>>, AppError> {
    let principals = state.auth.list_principals().await?;

    Ok(Json(principals.into_iter().map(Into::into).collect()))
}

pub async fn set_enabled(
    State(state): State<AppState>,
    CurrentPrincipal(admin): CurrentPrincipal,
    Path(identifier): Path<String>,
    payload: Result<Json<SetEnabledRequest>, JsonRejection>,
) -> Result<Json<PrincipalResponse>, AppError> {
    let Json(req) = payload?;

    if !req.enabled && admin.identifier == identifier {
        return Err(
            AuthError::validation("administrators cannot disable their own account").into(),
        );
    }

    let principal = state.auth.set_enabled(&identifier, req.enabled).await?;
    tracing::info!(
        admin = %admin.identifier,
        account = %identifier,
        enabled = req.enabled,
        "account status updated"
    );

    Ok(Json(principal.into()))
}

pub async fn set_role(
    State(state): State<AppState>,
    CurrentPrincipal(admin): CurrentPrincipal,
    Path(identifier): Path<String>,
    payload: Result<Json<SetRoleRequest>, JsonRejection>,
) -> Result<Json<PrincipalResponse>, AppError> {
    let Json(req) = payload?;

    let role: Role = req
        .role
        .parse()
        .map_err(|e: UnknownRole| AuthError::validation(e.to_string()))?;

    if !role.is_admin() && admin.identifier == identifier {
        return Err(
            AuthError::validation("administrators cannot demote their own account").into(),
        );
    }

    let principal = state.auth.set_role(&identifier, role).await?;
    tracing::info!(
        admin = %admin.identifier,
        account = %identifier,
        role = %role,
        "role updated"
    );

    Ok(Json(principal.into()))
}
