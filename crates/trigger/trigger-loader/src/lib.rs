//! # Trigger Loader
//!
//! Loads world-book and role-memory records into a [`TriggerEngine`].
//!
//! Repositories own I/O and parsing ([`EntryRepository`]); [`ToTriggerEntry`] adapts each
//! raw record; [`load_from_repository`] drops disabled records and hands the rest to
//! [`TriggerEngine::load_entries`].

mod converter;
mod records;
mod repository;

#[cfg(test)]
mod converter_test;

pub use converter::ToTriggerEntry;
pub use records::{
    parse_role_memories, parse_world_book, EntryUid, RoleMemoryRecord, WorldBookEntry,
};
pub use repository::{
    EntryRepository, InMemoryRepository, RoleMemoryFileRepository, WorldBookFileRepository,
};

use std::time::Instant;

use tracing::info;
use trigger::TriggerEngine;
use trigger_core::TriggerError;

/// Result of a load run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadResult {
    /// Records returned by the repository.
    pub total: usize,
    /// Entries now loaded in the engine.
    pub loaded: usize,
    /// Records skipped as disabled.
    pub disabled: usize,
    pub elapsed_ms: u64,
}

/// Reads every record from `repo`, converts the enabled ones and replaces the engine corpus.
///
/// # Errors
///
/// [`TriggerError::Repository`] when the repository fails; any error of
/// [`TriggerEngine::load_entries`] (duplicate ids, invalid weights).
pub async fn load_from_repository<Repo>(
    engine: &mut TriggerEngine<<Repo::Record as ToTriggerEntry>::Payload>,
    repo: &Repo,
) -> Result<LoadResult, TriggerError>
where
    Repo: EntryRepository,
    Repo::Record: ToTriggerEntry,
{
    let start_time = Instant::now();

    let records = repo.load().await.map_err(TriggerError::Repository)?;
    let total = records.len();
    let entries: Vec<_> = records
        .iter()
        .filter(|r| r.is_enabled())
        .map(ToTriggerEntry::to_trigger_entry)
        .collect();
    let disabled = total - entries.len();

    let loaded = engine.load_entries(entries)?;
    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    info!(total, loaded, disabled, elapsed_ms, "step: load from repository done");

    Ok(LoadResult {
        total,
        loaded,
        disabled,
        elapsed_ms,
    })
}
