//! services/api/src/web/rest.rs
//!
//! Contains the shared REST helpers and the master definition for the
//! OpenAPI specification.

use axum::http::StatusCode;
use prompt_vault_core::ports::PortError;
use tracing::error;
use utoipa::OpenApi;

use crate::web::prompts::{
    CreatePromptRequest, PromptResponse, TagsInput, UpdatePromptRequest,
};
use crate::web::subscription::{
    ProfileResponse, SubscriptionResponse, UserStatusResponse, WebhookAck,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        crate::web::prompts::list_prompts_handler,
        crate::web::prompts::get_prompt_handler,
        crate::web::prompts::create_prompt_handler,
        crate::web::prompts::update_prompt_handler,
        crate::web::prompts::delete_prompt_handler,
        crate::web::subscription::me_handler,
        crate::web::subscription::subscription_handler,
        crate::web::subscription::generate_pix_handler,
        crate::web::subscription::list_users_handler,
        crate::web::subscription::webhook_pix_handler,
    ),
    components(
        schemas(
            CreatePromptRequest,
            UpdatePromptRequest,
            TagsInput,
            PromptResponse,
            ProfileResponse,
            SubscriptionResponse,
            UserStatusResponse,
            WebhookAck
        )
    ),
    tags(
        (name = "Prompt Vault API", description = "Categorized prompts with a PIX-backed Pro subscription.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Translates a port error into the status and message a handler returns.
///
/// Storage and decode failures are logged and hidden behind a generic message.
pub fn port_error_response(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::SignatureInvalid | PortError::Unauthorized => {
            (StatusCode::UNAUTHORIZED, e.to_string())
        }
        PortError::Storage(_) | PortError::Decode(_) | PortError::Unexpected(_) => {
            error!("{}: {:?}", context, e);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}
