use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;

/// One durable slot holding the whole activity document. Implementations
/// overwrite the slot in place; there is no journal and no partial-write
/// protection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Returns the raw slot content, or `None` when the slot has never
    /// been written.
    async fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replaces the slot content wholesale.
    async fn write(&self, bytes: &[u8]) -> Result<()>;
}

/// Production backend: a single JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotBackend for FileSnapshot {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// Test backend keeping the slot in memory.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds the slot, e.g. with corrupt content.
    pub fn seeded(bytes: Vec<u8>) -> Self {
        Self {
            slot: Mutex::new(Some(bytes)),
        }
    }
}

#[async_trait]
impl SnapshotBackend for MemorySnapshot {
    async fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.slot.lock().expect("snapshot mutex poisoned").clone())
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        *self.slot.lock().expect("snapshot mutex poisoned") = Some(bytes.to_vec());
        Ok(())
    }
}
