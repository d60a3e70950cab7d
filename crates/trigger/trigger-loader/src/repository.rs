//! Entry repositories: where raw records come from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::records::{parse_role_memories, parse_world_book, RoleMemoryRecord, WorldBookEntry};

/// Source of raw records. Owns file I/O and format parsing.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    type Record: Send;

    async fn load(&self) -> Result<Vec<Self::Record>>;
}

/// Repository over records already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository<R> {
    records: Vec<R>,
}

impl<R> InMemoryRepository<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl<R: Clone + Send + Sync> EntryRepository for InMemoryRepository<R> {
    type Record = R;

    async fn load(&self) -> Result<Vec<R>> {
        Ok(self.records.clone())
    }
}

/// World-book JSON file on disk.
#[derive(Debug, Clone)]
pub struct WorldBookFileRepository {
    path: PathBuf,
}

impl WorldBookFileRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl EntryRepository for WorldBookFileRepository {
    type Record = WorldBookEntry;

    async fn load(&self) -> Result<Vec<WorldBookEntry>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read world book {}", self.path.display()))?;
        let entries = parse_world_book(&raw)?;
        info!(path = %self.path.display(), count = entries.len(), "world book read");
        Ok(entries)
    }
}

/// Role-memory JSON file (array of records) on disk.
#[derive(Debug, Clone)]
pub struct RoleMemoryFileRepository {
    path: PathBuf,
}

impl RoleMemoryFileRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl EntryRepository for RoleMemoryFileRepository {
    type Record = RoleMemoryRecord;

    async fn load(&self) -> Result<Vec<RoleMemoryRecord>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read role memories {}", self.path.display()))?;
        let records = parse_role_memories(&raw)?;
        info!(path = %self.path.display(), count = records.len(), "role memories read");
        Ok(records)
    }
}
