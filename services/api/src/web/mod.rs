pub mod middleware;
pub mod prompts;
pub mod rest;
pub mod state;
pub mod subscription;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use self::middleware::{identity_context, require_admin, require_auth};
use self::prompts::{
    create_prompt_handler, delete_prompt_handler, get_prompt_handler, list_prompts_handler,
    update_prompt_handler,
};
use self::rest::health_handler;
use self::state::AppState;
use self::subscription::{
    generate_pix_handler, list_users_handler, me_handler, subscription_handler,
    webhook_pix_handler,
};

/// Builds the API router. CORS and Swagger UI are added by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/prompts/{category}", get(list_prompts_handler))
        .route("/prompts/{category}/{id}", get(get_prompt_handler))
        .route("/webhook/pix", post(webhook_pix_handler));

    // Signed-in routes
    let member_routes = Router::new()
        .route("/me", get(me_handler))
        .route("/subscription", get(subscription_handler))
        .route("/subscription/generate-pix", post(generate_pix_handler))
        .route_layer(axum_middleware::from_fn(require_auth));

    // Administrator routes
    let admin_routes = Router::new()
        .route("/prompts/{category}", post(create_prompt_handler))
        .route(
            "/prompts/{category}/{id}",
            axum::routing::put(update_prompt_handler).delete(delete_prompt_handler),
        )
        .route("/users", get(list_users_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(member_routes)
        .merge(admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            identity_context,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
