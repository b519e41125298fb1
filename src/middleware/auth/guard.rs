use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::api::v1::extractors::{AuthCtx, Denied};
use crate::error::AppError;
use crate::services::auth::Requirement;

/// Reject requests whose `AuthCtx` does not satisfy the matched requirement.
///
/// Runs after the access filter; a missing context is treated as anonymous.
pub async fn guard_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let anonymous;
    let ctx = match req.extensions().get::<AuthCtx>() {
        Some(ctx) => ctx,
        None => {
            anonymous = AuthCtx::anonymous(Requirement::Authenticated);
            &anonymous
        }
    };

    if let Err(denied) = ctx.authorize() {
        if denied == Denied::Forbidden {
            tracing::warn!(
                identifier = ctx.principal().map(|p| p.identifier.as_str()).unwrap_or_default(),
                method = %req.method(),
                path = %req.uri().path(),
                requirement = ?ctx.requirement(),
                "access denied"
            );
        }
        return Err(denied.into());
    }

    Ok(next.run(req).await)
}
