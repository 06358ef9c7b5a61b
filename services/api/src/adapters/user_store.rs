//! services/api/src/adapters/user_store.rs
//!
//! The JSON-file implementation of the `SubscriptionRepository` port.

use async_trait::async_trait;
use prompt_vault_core::domain::UserStatus;
use prompt_vault_core::ports::{PortError, PortResult, SubscriptionRepository};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapters::json_file::JsonFile;
use crate::adapters::record_store::{RecordStore, StoredRecord};

/// Stores one subscription flag per email in a single JSON file.
pub struct JsonUserStatusStore {
    records: RecordStore<UserStatusRecord>,
}

impl JsonUserStatusStore {
    pub fn new(file: JsonFile) -> Self {
        Self {
            records: RecordStore::new("user", file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserStatusRecord {
    email: String,
    #[serde(default)]
    is_pro: bool,
}

impl UserStatusRecord {
    fn to_domain(self) -> UserStatus {
        UserStatus {
            email: self.email,
            is_pro: self.is_pro,
        }
    }
}

impl StoredRecord for UserStatusRecord {
    fn key(&self) -> &str {
        &self.email
    }
}

fn normalize_email(email: &str) -> PortResult<&str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(PortError::Validation("email must not be empty".to_string()));
    }
    Ok(email)
}

#[async_trait]
impl SubscriptionRepository for JsonUserStatusStore {
    async fn is_user_pro(&self, email: &str) -> PortResult<bool> {
        let email = normalize_email(email)?;
        match self.records.get(email).await {
            Ok(record) => Ok(record.is_pro),
            Err(PortError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn mark_user_pro(&self, email: &str, is_pro: bool) -> PortResult<()> {
        let email = normalize_email(email)?;
        self.records
            .upsert(
                email,
                || UserStatusRecord {
                    email: email.to_string(),
                    is_pro,
                },
                |record| record.is_pro = is_pro,
            )
            .await?;
        info!(email, is_pro, "subscription status updated");
        Ok(())
    }

    async fn list_users(&self) -> PortResult<Vec<UserStatus>> {
        let records = self.records.list(|_| true).await?;
        Ok(records.into_iter().map(UserStatusRecord::to_domain).collect())
    }
}
