//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::adapters::{HmacSignatureVerifier, JsonFile, JsonPromptStore, JsonUserStatusStore};
use crate::config::Config;
use prompt_vault_core::ports::{PromptRepository, SignatureVerifier, SubscriptionRepository};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub prompts: Arc<dyn PromptRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub signature_verifier: Arc<dyn SignatureVerifier>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the JSON-file stores and the HMAC verifier described by `config`.
    pub fn from_config(config: Arc<Config>) -> Self {
        let prompts = JsonPromptStore::new(JsonFile::new(
            config.prompts_path(),
            config.storage_timeout,
        ));
        let subscriptions = JsonUserStatusStore::new(JsonFile::new(
            config.users_path(),
            config.storage_timeout,
        ));
        let signature_verifier = HmacSignatureVerifier::new(config.webhook_secret.clone());

        Self {
            prompts: Arc::new(prompts),
            subscriptions: Arc::new(subscriptions),
            signature_verifier: Arc::new(signature_verifier),
            config,
        }
    }
}
