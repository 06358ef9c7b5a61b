//! services/api/src/adapters/codec.rs
//!
//! Serializes a collection of records to and from its on-disk JSON array.

use prompt_vault_core::ports::{PortError, PortResult};
use serde::{de::DeserializeOwned, Serialize};

/// Decodes a JSON array of records. Anything else is a `PortError::Decode`.
pub fn decode<R: DeserializeOwned>(bytes: &[u8]) -> PortResult<Vec<R>> {
    serde_json::from_slice(bytes).map_err(|e| PortError::Decode(e.to_string()))
}

/// Encodes records as a pretty-printed JSON array (two-space indent).
pub fn encode<R: Serialize>(records: &[R]) -> PortResult<Vec<u8>> {
    serde_json::to_vec_pretty(records).map_err(|e| PortError::Unexpected(e.to_string()))
}
