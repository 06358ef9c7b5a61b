//! services/api/src/web/subscription.rs
//!
//! Subscription endpoints: the caller's profile, the PIX payment payload and
//! the provider's payment webhook that upgrades a user to Pro.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use bytes::Bytes;
use prompt_vault_core::domain::{AuthContext, PaymentNotification, SubscriptionStatus, UserStatus};
use prompt_vault_core::ports::PortError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::web::rest::port_error_response;
use crate::web::state::AppState;

/// Header carrying the provider's HMAC of the webhook body.
pub const SIGNATURE_HEADER: &str = "x-openpix-signature";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub email: String,
    pub is_admin: bool,
    pub is_pro: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub email: String,
    pub is_pro: bool,
    /// `free` or `pro`.
    pub status: String,
    /// The PIX key to pay, for copy-and-paste or QR rendering.
    pub pix_copy_paste: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    pub email: String,
    pub is_pro: bool,
}

impl From<UserStatus> for UserStatusResponse {
    fn from(user: UserStatus) -> Self {
        Self {
            email: user.email,
            is_pro: user.is_pro,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub success: bool,
}

/// The provider's notification body. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct PixWebhookPayload {
    status: String,
    #[serde(rename = "correlationID")]
    correlation_id: String,
}

impl From<PixWebhookPayload> for PaymentNotification {
    fn from(payload: PixWebhookPayload) -> Self {
        Self {
            status: payload.status,
            correlation_id: payload.correlation_id,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /me - The signed-in user's profile
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile of the signed-in user", body = ProfileResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let email = signed_in_email(&auth)?;
    let is_pro = state
        .subscriptions
        .is_user_pro(&email)
        .await
        .map_err(|e| port_error_response("Failed to load subscription", e))?;

    Ok(Json(ProfileResponse {
        is_admin: auth.is_admin(&state.config.admin_email),
        email,
        is_pro,
    }))
}

/// GET /subscription - Subscription status and the PIX payment payload
#[utoipa::path(
    get,
    path = "/subscription",
    responses(
        (status = 200, description = "Subscription status and PIX payload", body = SubscriptionResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn subscription_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<SubscriptionResponse>, (StatusCode, String)> {
    subscription_payload(&state, &auth).await.map(Json)
}

/// POST /subscription/generate-pix - Regenerate the PIX payment payload
#[utoipa::path(
    post,
    path = "/subscription/generate-pix",
    responses(
        (status = 200, description = "Subscription status and PIX payload", body = SubscriptionResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn generate_pix_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<SubscriptionResponse>, (StatusCode, String)> {
    subscription_payload(&state, &auth).await.map(Json)
}

/// GET /users - Every recorded subscription (administrators only)
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Recorded users in insertion order", body = [UserStatusResponse]),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserStatusResponse>>, (StatusCode, String)> {
    let users = state
        .subscriptions
        .list_users()
        .await
        .map_err(|e| port_error_response("Failed to load users", e))?;

    Ok(Json(users.into_iter().map(UserStatusResponse::from).collect()))
}

/// POST /webhook/pix - Payment notification from the PIX provider
///
/// The body must be signed; a `COMPLETED` payment upgrades the user whose
/// email is embedded in the correlation id.
#[utoipa::path(
    post,
    path = "/webhook/pix",
    request_body(content_type = "application/json", description = "Provider notification with `status` and `correlationID`."),
    responses(
        (status = 200, description = "Notification accepted", body = WebhookAck),
        (status = 400, description = "Malformed notification"),
        (status = 401, description = "Missing or invalid signature"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-openpix-signature" = String, Header, description = "Base64 HMAC-SHA256 of the raw body.")
    )
)]
pub async fn webhook_pix_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, (StatusCode, Json<Value>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if signature.is_empty() || !state.signature_verifier.verify(signature, &body) {
        warn!("rejected PIX webhook with a missing or invalid signature");
        return Err(webhook_error(PortError::SignatureInvalid));
    }

    let notification: PaymentNotification = serde_json::from_slice::<PixWebhookPayload>(&body)
        .map_err(|e| webhook_error(PortError::Validation(e.to_string())))?
        .into();

    if !notification.is_completed() {
        info!(status = %notification.status, "ignoring non-completed PIX notification");
        return Ok(Json(WebhookAck { success: true }));
    }

    let email = notification.payer_email().map_err(webhook_error)?;
    state
        .subscriptions
        .mark_user_pro(&email, true)
        .await
        .map_err(webhook_error)?;

    info!(email = %email, "payment completed, user upgraded to Pro");
    Ok(Json(WebhookAck { success: true }))
}

//=========================================================================================
// Helpers
//=========================================================================================

fn signed_in_email(auth: &AuthContext) -> Result<String, (StatusCode, String)> {
    auth.user_email()
        .map(str::to_string)
        .ok_or((StatusCode::UNAUTHORIZED, "Authentication required".to_string()))
}

async fn subscription_payload(
    state: &AppState,
    auth: &AuthContext,
) -> Result<SubscriptionResponse, (StatusCode, String)> {
    let email = signed_in_email(auth)?;
    let is_pro = state
        .subscriptions
        .is_user_pro(&email)
        .await
        .map_err(|e| port_error_response("Failed to load subscription", e))?;

    let status = match SubscriptionStatus::from(is_pro) {
        SubscriptionStatus::Free => "free",
        SubscriptionStatus::Pro => "pro",
    };

    Ok(SubscriptionResponse {
        email,
        is_pro,
        status: status.to_string(),
        pix_copy_paste: state.config.pix_key.clone(),
    })
}

fn webhook_error(e: PortError) -> (StatusCode, Json<Value>) {
    match e {
        PortError::SignatureInvalid | PortError::Unauthorized => {
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid signature" })))
        }
        PortError::Validation(msg) | PortError::NotFound(msg) => {
            warn!("rejected PIX webhook: {}", msg);
            (StatusCode::BAD_REQUEST, Json(json!({ "error": msg })))
        }
        PortError::Storage(_) | PortError::Decode(_) | PortError::Unexpected(_) => {
            error!("PIX webhook failed: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal error" })))
        }
    }
}
