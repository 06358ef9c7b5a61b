//! services/api/src/adapters/json_file.rs
//!
//! The storage primitive behind every collection: one JSON document on disk,
//! read and replaced wholesale. Writes go through a temporary file and an
//! atomic rename so readers never observe a half-written document.

use prompt_vault_core::ports::{PortError, PortResult};
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// What an absent collection is initialized to.
pub const EMPTY_COLLECTION: &[u8] = b"[]";

/// A whole-file JSON document with bounded I/O.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    io_timeout: Duration,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>, io_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            io_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document, or `None` if it does not exist yet.
    pub async fn read(&self) -> PortResult<Option<Vec<u8>>> {
        let result = self.bounded("read", tokio::fs::read(&self.path)).await?;
        match result {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error("read", e)),
        }
    }

    /// Writes `[]` if the document is absent and returns the current content.
    ///
    /// Callers must hold the collection's write lock, otherwise this could race
    /// a concurrent `save`.
    pub async fn initialize_if_absent(&self) -> PortResult<Vec<u8>> {
        if let Some(bytes) = self.read().await? {
            return Ok(bytes);
        }
        tracing::info!(path = %self.path.display(), "initializing empty collection");
        self.save(EMPTY_COLLECTION).await?;
        Ok(EMPTY_COLLECTION.to_vec())
    }

    /// Fully replaces the document.
    ///
    /// Write, fsync and rename run as one blocking unit. When the timeout
    /// fires the unit is told to abandon before its rename and is then awaited,
    /// so the result always says whether the new document was committed.
    pub async fn save(&self, bytes: &[u8]) -> PortResult<()> {
        let abandon = Arc::new(AtomicBool::new(false));
        let mut unit = tokio::task::spawn_blocking({
            let path = self.path.clone();
            let bytes = bytes.to_vec();
            let abandon = abandon.clone();
            move || replace_file(&path, &bytes, &abandon)
        });

        let joined = match tokio::time::timeout(self.io_timeout, &mut unit).await {
            Ok(joined) => joined,
            Err(_) => {
                abandon.store(true, Ordering::SeqCst);
                tracing::warn!(
                    path = %self.path.display(),
                    "save exceeded {:?}, waiting for it to settle",
                    self.io_timeout
                );
                unit.await
            }
        };

        match joined {
            Ok(Ok(Replaced::Committed)) => Ok(()),
            Ok(Ok(Replaced::Abandoned)) => Err(PortError::Storage(format!(
                "save of {} timed out after {:?}",
                self.path.display(),
                self.io_timeout
            ))),
            Ok(Err(e)) => Err(self.storage_error("save", e)),
            Err(e) => Err(PortError::Unexpected(format!(
                "save of {} did not complete: {e}",
                self.path.display()
            ))),
        }
    }

    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = T>) -> PortResult<T> {
        tokio::time::timeout(self.io_timeout, fut).await.map_err(|_| {
            PortError::Storage(format!(
                "{op} of {} timed out after {:?}",
                self.path.display(),
                self.io_timeout
            ))
        })
    }

    fn storage_error(&self, op: &str, e: std::io::Error) -> PortError {
        PortError::Storage(format!("{op} of {} failed: {e}", self.path.display()))
    }
}

/// How a blocking save ended.
#[derive(Debug)]
enum Replaced {
    Committed,
    Abandoned,
}

/// Writes `bytes` beside `path` and renames them over it. The temp file is
/// removed unless the rename happened.
fn replace_file(path: &Path, bytes: &[u8], abandon: &AtomicBool) -> std::io::Result<Replaced> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    let outcome = write_then_rename(&temp_path, path, bytes, abandon);
    match &outcome {
        Ok(Replaced::Committed) => {
            // The rename is already visible, so a failed sync is not a failed save.
            if let Err(e) = parent.map_or(Ok(()), sync_dir) {
                tracing::warn!(path = %path.display(), "directory fsync failed: {e}");
            }
        }
        _ => {
            let _ = std::fs::remove_file(&temp_path);
        }
    }
    outcome
}

fn write_then_rename(
    temp_path: &Path,
    path: &Path,
    bytes: &[u8],
    abandon: &AtomicBool,
) -> std::io::Result<Replaced> {
    let mut file = std::fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    if abandon.load(Ordering::SeqCst) {
        return Ok(Replaced::Abandoned);
    }
    std::fs::rename(temp_path, path)?;
    Ok(Replaced::Committed)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
