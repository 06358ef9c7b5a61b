//! services/api/src/adapters/record_store.rs
//!
//! A generic load-mutate-save CRUD engine over a single JSON collection.
//!
//! Every operation loads the whole collection. Mutations hold the
//! collection's write lock across load, change and save, so concurrent
//! writers are linearized and no update is lost. Reads take no lock; saves
//! are atomic renames, so a read always sees the last persisted document.

use crate::adapters::codec;
use crate::adapters::json_file::JsonFile;
use prompt_vault_core::ports::{PortError, PortResult};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::marker::PhantomData;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// A record with a unique string key.
pub trait StoredRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn key(&self) -> &str;
}

/// Whether a mutation needs to be written back.
enum Outcome<T> {
    Changed(T),
    Unchanged(T),
}

pub struct RecordStore<R> {
    name: &'static str,
    file: JsonFile,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: StoredRecord> RecordStore<R> {
    pub fn new(name: &'static str, file: JsonFile) -> Self {
        Self {
            name,
            file,
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    /// Records matching `predicate`, in insertion order.
    pub async fn list<P>(&self, predicate: P) -> PortResult<Vec<R>>
    where
        P: Fn(&R) -> bool + Send,
    {
        let records = self.load().await?;
        Ok(records.into_iter().filter(|r| predicate(r)).collect())
    }

    pub async fn get(&self, key: &str) -> PortResult<R> {
        self.load()
            .await?
            .into_iter()
            .find(|r| r.key() == key)
            .ok_or_else(|| self.not_found(key))
    }

    /// Appends the record `build` makes from a freshly generated, unused id.
    pub async fn create<F>(&self, build: F) -> PortResult<R>
    where
        F: FnOnce(String) -> R + Send,
    {
        let record = self
            .mutate(|records| {
                let taken: HashSet<&str> = records.iter().map(|r| r.key()).collect();
                let id = loop {
                    let candidate = Uuid::new_v4().to_string();
                    if !taken.contains(candidate.as_str()) {
                        break candidate;
                    }
                };
                let record = build(id);
                records.push(record.clone());
                Ok(Outcome::Changed(record))
            })
            .await?;
        debug!(collection = self.name, key = record.key(), "record created");
        Ok(record)
    }

    /// Applies `apply` to the record under `key`. Never inserts.
    pub async fn update<F>(&self, key: &str, apply: F) -> PortResult<R>
    where
        F: FnOnce(&mut R) + Send,
    {
        let record = self
            .mutate(|records| {
                let record = records
                    .iter_mut()
                    .find(|r| r.key() == key)
                    .ok_or_else(|| self.not_found(key))?;
                apply(record);
                Ok(Outcome::Changed(record.clone()))
            })
            .await?;
        debug!(collection = self.name, key, "record updated");
        Ok(record)
    }

    /// Removes the record under `key`, returning whether one existed.
    pub async fn delete(&self, key: &str) -> PortResult<bool> {
        let removed = self
            .mutate(|records| match records.iter().position(|r| r.key() == key) {
                Some(index) => {
                    records.remove(index);
                    Ok(Outcome::Changed(true))
                }
                None => Ok(Outcome::Unchanged(false)),
            })
            .await?;
        debug!(collection = self.name, key, removed, "record delete");
        Ok(removed)
    }

    /// Merges onto the record under `key`, or inserts what `insert` builds.
    pub async fn upsert<I, M>(&self, key: &str, insert: I, merge: M) -> PortResult<()>
    where
        I: FnOnce() -> R + Send,
        M: FnOnce(&mut R) + Send,
    {
        let inserted = self
            .mutate(|records| match records.iter().position(|r| r.key() == key) {
                Some(index) => {
                    merge(&mut records[index]);
                    Ok(Outcome::Changed(false))
                }
                None => {
                    records.push(insert());
                    Ok(Outcome::Changed(true))
                }
            })
            .await?;
        debug!(collection = self.name, key, inserted, "record upsert");
        Ok(())
    }

    async fn load(&self) -> PortResult<Vec<R>> {
        let bytes = match self.file.read().await? {
            Some(bytes) => bytes,
            None => {
                let _guard = self.write_lock.lock().await;
                self.file.initialize_if_absent().await?
            }
        };
        self.decode(&bytes)
    }

    async fn mutate<T, F>(&self, operation: F) -> PortResult<T>
    where
        F: FnOnce(&mut Vec<R>) -> PortResult<Outcome<T>> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let bytes = self.file.initialize_if_absent().await?;
        let mut records = self.decode(&bytes)?;

        match operation(&mut records)? {
            Outcome::Changed(value) => {
                self.file.save(&codec::encode(&records)?).await?;
                Ok(value)
            }
            Outcome::Unchanged(value) => Ok(value),
        }
    }

    fn decode(&self, bytes: &[u8]) -> PortResult<Vec<R>> {
        codec::decode(bytes).map_err(|e| {
            tracing::error!(
                collection = self.name,
                path = %self.file.path().display(),
                "refusing to use corrupt collection: {e}"
            );
            e
        })
    }

    fn not_found(&self, key: &str) -> PortError {
        PortError::NotFound(format!("{} '{}' not found", self.name, key))
    }
}
