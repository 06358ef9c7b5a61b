//! services/api/src/web/prompts.rs
//!
//! REST handlers for browsing and administering prompts.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use prompt_vault_core::domain::{normalize_tags, split_tags, AuthContext, NewPrompt, Prompt, PromptPatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::web::rest::port_error_response;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Tags as a JSON list, or as the comma-separated string HTML forms submit.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => normalize_tags(tags),
            TagsInput::Csv(raw) => split_tags(&raw),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Option<TagsInput>,
    #[serde(default)]
    pub is_public: bool,
}

/// Every field is optional; omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromptRequest {
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<TagsInput>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub id: String,
    pub category: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Prompt> for PromptResponse {
    fn from(prompt: Prompt) -> Self {
        Self {
            id: prompt.id,
            category: prompt.category,
            title: prompt.title,
            content: prompt.content,
            tags: prompt.tags,
            is_public: prompt.is_public,
            created_by: prompt.created_by,
            created_at: prompt.created_at,
            updated_at: prompt.updated_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /prompts/{category} - List the prompts of a category
#[utoipa::path(
    get,
    path = "/prompts/{category}",
    params(("category" = String, Path, description = "Prompt category")),
    responses(
        (status = 200, description = "Prompts in insertion order", body = [PromptResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_prompts_handler(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<Vec<PromptResponse>>, (StatusCode, String)> {
    let prompts = state
        .prompts
        .get_prompts_by_category(&category)
        .await
        .map_err(|e| port_error_response("Failed to load prompts", e))?;

    Ok(Json(prompts.into_iter().map(PromptResponse::from).collect()))
}

/// GET /prompts/{category}/{id} - Fetch one prompt
#[utoipa::path(
    get,
    path = "/prompts/{category}/{id}",
    params(
        ("category" = String, Path, description = "Prompt category"),
        ("id" = String, Path, description = "Prompt id")
    ),
    responses(
        (status = 200, description = "The prompt", body = PromptResponse),
        (status = 404, description = "Prompt not found")
    )
)]
pub async fn get_prompt_handler(
    State(state): State<Arc<AppState>>,
    Path((_category, id)): Path<(String, String)>,
) -> Result<Json<PromptResponse>, (StatusCode, String)> {
    let prompt = state
        .prompts
        .get_prompt_by_id(&id)
        .await
        .map_err(|e| port_error_response("Failed to load prompt", e))?;

    Ok(Json(prompt.into()))
}

/// POST /prompts/{category} - Create a prompt (administrators only)
#[utoipa::path(
    post,
    path = "/prompts/{category}",
    params(("category" = String, Path, description = "Prompt category")),
    request_body = CreatePromptRequest,
    responses(
        (status = 201, description = "Prompt created", body = PromptResponse),
        (status = 400, description = "Invalid prompt fields"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn create_prompt_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(category): Path<String>,
    payload: Result<Json<CreatePromptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let Json(req) = payload.map_err(malformed_body)?;
    let created_by = auth.user_email().unwrap_or_default().to_string();
    let data = NewPrompt {
        category,
        title: req.title,
        content: req.content,
        tags: req.tags.map(TagsInput::into_tags).unwrap_or_default(),
        is_public: req.is_public,
        created_by,
    };

    let prompt = state
        .prompts
        .create_prompt(data)
        .await
        .map_err(|e| port_error_response("Failed to create prompt", e))?;

    info!(id = %prompt.id, category = %prompt.category, "prompt created");
    Ok((StatusCode::CREATED, Json(PromptResponse::from(prompt))))
}

/// PUT /prompts/{category}/{id} - Update a prompt (administrators only)
#[utoipa::path(
    put,
    path = "/prompts/{category}/{id}",
    params(
        ("category" = String, Path, description = "Prompt category"),
        ("id" = String, Path, description = "Prompt id")
    ),
    request_body = UpdatePromptRequest,
    responses(
        (status = 200, description = "Prompt updated", body = PromptResponse),
        (status = 400, description = "Invalid prompt fields"),
        (status = 404, description = "Prompt not found")
    )
)]
pub async fn update_prompt_handler(
    State(state): State<Arc<AppState>>,
    Path((_category, id)): Path<(String, String)>,
    payload: Result<Json<UpdatePromptRequest>, JsonRejection>,
) -> Result<Json<PromptResponse>, (StatusCode, String)> {
    let Json(req) = payload.map_err(malformed_body)?;
    let patch = PromptPatch {
        category: req.category,
        title: req.title,
        content: req.content,
        tags: req.tags.map(TagsInput::into_tags),
        is_public: req.is_public,
    };

    let prompt = state
        .prompts
        .update_prompt(&id, patch)
        .await
        .map_err(|e| port_error_response("Failed to update prompt", e))?;

    info!(id = %prompt.id, "prompt updated");
    Ok(Json(prompt.into()))
}

/// DELETE /prompts/{category}/{id} - Delete a prompt (administrators only)
#[utoipa::path(
    delete,
    path = "/prompts/{category}/{id}",
    params(
        ("category" = String, Path, description = "Prompt category"),
        ("id" = String, Path, description = "Prompt id")
    ),
    responses(
        (status = 204, description = "Prompt deleted"),
        (status = 404, description = "Prompt not found")
    )
)]
pub async fn delete_prompt_handler(
    State(state): State<Arc<AppState>>,
    Path((_category, id)): Path<(String, String)>,
) -> Result<StatusCode, (StatusCode, String)> {
    let deleted = state
        .prompts
        .delete_prompt(&id)
        .await
        .map_err(|e| port_error_response("Failed to delete prompt", e))?;

    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Prompt not found".to_string()));
    }
    info!(id = %id, "prompt deleted");
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Missing, mistyped or unparsable fields are a bad request like any other
/// invalid prompt input.
fn malformed_body(rejection: JsonRejection) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, rejection.body_text())
}
