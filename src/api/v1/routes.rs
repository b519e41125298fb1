/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証/認可の要否はここではなく AccessPolicy (services::auth::access_policy) が決める
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

use crate::api::v1::handlers::{
    admin::{list_users, set_enabled, set_role},
    auth::{login, logout, register, validate},
    health::{health, status},
    users::{change_password, get_user, me},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/validate", get(validate))
        .route("/auth/logout", post(logout))
        .route("/users/me", get(me))
        .route("/users/me/password", put(change_password))
        .route("/users/{identifier}", get(get_user))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{identifier}/enabled", put(set_enabled))
        .route("/admin/users/{identifier}/role", put(set_role))
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::not_found("route")
}
