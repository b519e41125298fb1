/*
 * Responsibility
 * - /users 系 handler (認証済みユーザー自身の情報)
 * - 他人のリソースは ownership check (本人 or ADMIN) を通してから返す
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    api::v1::{
        dto::{
            auth::MessageResponse,
            users::{ChangePasswordRequest, PrincipalResponse},
        },
        extractors::{AuthCtxExtractor, CurrentPrincipal},
    },
    error::AppError,
    state::AppState,
};

pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<PrincipalResponse> {
    Json(principal.into())
}

pub async fn get_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(identifier): Path<String>,
) -> Result<Json<PrincipalResponse>, AppError> {
    // non-owners get 403 whether or not the account exists
    ctx.ensure_owner_or_admin(&identifier)?;

    let principal = state.auth.find_principal(&identifier).await?;

    Ok(Json(principal.into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = payload?;

    state
        .auth
        .change_password(&principal.identifier, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(MessageResponse::new("password changed")))
}
