//! crates/prompt_vault_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage or payment-provider implementations.

use async_trait::async_trait;
use crate::domain::{NewPrompt, Prompt, PromptPatch, UserStatus};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., filesystem, provider).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Stored document is corrupt: {0}")]
    Decode(String),
    #[error("Invalid webhook signature")]
    SignatureInvalid,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// Every prompt, in insertion order.
    async fn list_prompts(&self) -> PortResult<Vec<Prompt>>;

    async fn get_prompts_by_category(&self, category: &str) -> PortResult<Vec<Prompt>>;

    async fn get_prompt_by_id(&self, id: &str) -> PortResult<Prompt>;

    async fn create_prompt(&self, data: NewPrompt) -> PortResult<Prompt>;

    async fn update_prompt(&self, id: &str, data: PromptPatch) -> PortResult<Prompt>;

    /// Returns whether a prompt was removed.
    async fn delete_prompt(&self, id: &str) -> PortResult<bool>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// `false` for emails the store has never seen.
    async fn is_user_pro(&self, email: &str) -> PortResult<bool>;

    /// Inserts or updates the flag for `email`.
    async fn mark_user_pro(&self, email: &str, is_pro: bool) -> PortResult<()>;

    async fn list_users(&self) -> PortResult<Vec<UserStatus>>;
}

pub trait SignatureVerifier: Send + Sync {
    /// Checks a webhook signature header against the raw request body.
    fn verify(&self, signature: &str, payload: &[u8]) -> bool;
}
