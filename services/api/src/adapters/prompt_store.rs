//! services/api/src/adapters/prompt_store.rs
//!
//! The JSON-file implementation of the `PromptRepository` port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prompt_vault_core::domain::{normalize_tags, NewPrompt, Prompt, PromptPatch};
use prompt_vault_core::ports::{PortResult, PromptRepository};
use serde::{Deserialize, Serialize};

use crate::adapters::json_file::JsonFile;
use crate::adapters::record_store::{RecordStore, StoredRecord};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Stores prompts as a JSON array in a single file.
pub struct JsonPromptStore {
    records: RecordStore<PromptRecord>,
}

impl JsonPromptStore {
    pub fn new(file: JsonFile) -> Self {
        Self {
            records: RecordStore::new("prompt", file),
        }
    }
}

//=========================================================================================
// On-disk Record Struct
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptRecord {
    id: String,
    category: String,
    title: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PromptRecord {
    fn to_domain(self) -> Prompt {
        Prompt {
            id: self.id,
            category: self.category,
            title: self.title,
            content: self.content,
            tags: self.tags,
            is_public: self.is_public,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn from_domain(prompt: Prompt) -> Self {
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

impl StoredRecord for PromptRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

//=========================================================================================
// `PromptRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl PromptRepository for JsonPromptStore {
    async fn list_prompts(&self) -> PortResult<Vec<Prompt>> {
        let records = self.records.list(|_| true).await?;
        Ok(records.into_iter().map(PromptRecord::to_domain).collect())
    }

    async fn get_prompts_by_category(&self, category: &str) -> PortResult<Vec<Prompt>> {
        let records = self.records.list(|r| r.category == category).await?;
        Ok(records.into_iter().map(PromptRecord::to_domain).collect())
    }

    async fn get_prompt_by_id(&self, id: &str) -> PortResult<Prompt> {
        Ok(self.records.get(id).await?.to_domain())
    }

    async fn create_prompt(&self, mut data: NewPrompt) -> PortResult<Prompt> {
        data.validate()?;
        data.tags = normalize_tags(&data.tags);

        let record = self
            .records
            .create(|id| PromptRecord::from_domain(Prompt::from_new(id, data, Utc::now())))
            .await?;
        Ok(record.to_domain())
    }

    async fn update_prompt(&self, id: &str, mut data: PromptPatch) -> PortResult<Prompt> {
        data.validate()?;
        data.tags = data.tags.map(normalize_tags);

        let record = self
            .records
            .update(id, |record| {
                let mut prompt = record.clone().to_domain();
                data.apply_to(&mut prompt);
                prompt.touch(Utc::now());
                *record = PromptRecord::from_domain(prompt);
            })
            .await?;
        Ok(record.to_domain())
    }

    async fn delete_prompt(&self, id: &str) -> PortResult<bool> {
        self.records.delete(id).await
    }
}
