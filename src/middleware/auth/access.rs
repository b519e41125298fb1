//! Bearer token (JWT) → `AuthCtx` を extensions に入れる
//!
//! - AccessPolicy で route の Requirement を決める
//! - Public なら token を見ずに匿名 AuthCtx で転送する (不正な token が付いていても)
//! - それ以外は `Authorization: Bearer <jwt>` を AuthenticationService::validate で検証
//! - 検証失敗は拒否せず匿名として転送する。401/403 の判断は guard の責務

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::{AuthCtx, bearer_token};
use crate::middleware::auth::guard;
use crate::services::auth::Requirement;
use crate::state::AppState;

/// Attach the access filter (outer) and the authorization guard (inner).
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router
        .layer(middleware::from_fn(guard::guard_middleware))
        // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
        .layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let requirement = state
        .policy
        .requirement(req.method(), req.uri().path())
        .clone();

    let auth_ctx = if requirement.is_public() {
        AuthCtx::anonymous(requirement)
    } else {
        // `Body` is not Sync: no borrow of `req` may live across the await
        let token = bearer_token(req.headers()).map(str::to_owned);
        let path = req.uri().path().to_owned();
        resolve(&state, token, &path, requirement).await
    };

    // middleware → guard / extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    next.run(req).await
}

async fn resolve(
    state: &AppState,
    token: Option<String>,
    path: &str,
    requirement: Requirement,
) -> AuthCtx {
    let Some(token) = token else {
        return AuthCtx::anonymous(requirement);
    };

    match state.auth.validate(&token).await {
        Ok(validated) => {
            tracing::debug!(
                identifier = %validated.principal.identifier,
                role = %validated.principal.role,
                "bearer token accepted"
            );
            AuthCtx::authenticated(validated.principal, requirement)
        }
        Err(err) if err.is_token_rejection() => {
            tracing::warn!(
                error = %err,
                path,
                "bearer token rejected; continuing anonymously"
            );
            AuthCtx::anonymous(requirement)
        }
        Err(err) => {
            tracing::error!(error = ?err, "token validation failed; continuing anonymously");
            AuthCtx::anonymous(requirement)
        }
    }
}
