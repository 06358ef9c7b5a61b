//! services/api/src/web/middleware.rs
//!
//! Identity and access-control middleware.
//!
//! Sessions live with the upstream identity provider; it forwards the
//! signed-in user's email in a trusted header. These layers turn that header
//! into an `AuthContext` and gate routes on it.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use prompt_vault_core::domain::AuthContext;
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Inserts the caller's `AuthContext` into the request extensions.
///
/// Runs on every route; requests without the identity header are anonymous.
pub async fn identity_context(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = req
        .headers()
        .get(state.config.identity_email_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(AuthContext::for_email)
        .unwrap_or_else(AuthContext::anonymous);

    req.extensions_mut().insert(context);
    next.run(req).await
}

/// Rejects anonymous callers with 401 Unauthorized.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, StatusCode> {
    let authenticated = req
        .extensions()
        .get::<AuthContext>()
        .is_some_and(|ctx| ctx.user_email().is_some());
    if !authenticated {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

/// Rejects anonymous callers with 401 and non-administrators with 403.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let context = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .unwrap_or_default();

    let Some(email) = context.user_email() else {
        return Err((StatusCode::UNAUTHORIZED, "Authentication required".to_string()));
    };
    if !context.is_admin(&state.config.admin_email) {
        warn!(email, path = %req.uri().path(), "non-admin tried an admin route");
        return Err((
            StatusCode::FORBIDDEN,
            "Access denied. Only administrators can access this resource.".to_string(),
        ));
    }
    Ok(next.run(req).await)
}
