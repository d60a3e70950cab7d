//! # Engine State
//!
//! The mutable part of an engine instance. Loaded entries are never mutated; only the
//! derived collections (injection history, statistics) change between runs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entry::TriggerEntry;

/// Record of a temporary injection, used for cooldown checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooldownRecord {
    pub entry_id: String,
    pub injected_at: DateTime<Utc>,
    /// Pruned once `now > expire_at`.
    pub expire_at: DateTime<Utc>,
}

/// Injection counter of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularEntry {
    pub entry_id: String,
    pub count: u64,
}

/// Running counters maintained by the stats tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerStats {
    pub total_triggers: u64,
    pub today_triggers: u64,
    /// Incremental mean of pipeline duration, in milliseconds.
    pub avg_response_time_ms: f64,
    /// Top entries by injection count, descending.
    pub popular_entries: Vec<PopularEntry>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl TriggerStats {
    /// Length of `popular_entries` after every update.
    pub const POPULAR_LIMIT: usize = 10;
}

impl Default for TriggerStats {
    fn default() -> Self {
        Self {
            total_triggers: 0,
            today_triggers: 0,
            avg_response_time_ms: 0.0,
            popular_entries: Vec::new(),
            last_updated: None,
        }
    }
}

/// State exclusively owned by one engine instance.
#[derive(Debug, Clone)]
pub struct EngineState<P> {
    /// Constants first, then descending priority.
    pub loaded_entries: Vec<Arc<TriggerEntry<P>>>,
    pub injection_history: Vec<CooldownRecord>,
    /// Last injection time per entry id. Not pruned with the cooldown history.
    pub last_injected: HashMap<String, DateTime<Utc>>,
    pub stats: TriggerStats,
    pub last_updated: DateTime<Utc>,
}

impl<P> EngineState<P> {
    pub fn new() -> Self {
        Self {
            loaded_entries: Vec::new(),
            injection_history: Vec::new(),
            last_injected: HashMap::new(),
            stats: TriggerStats::default(),
            last_updated: Utc::now(),
        }
    }

    /// Most recent injection time of an entry, if it was ever injected.
    pub fn last_injected_at(&self, entry_id: &str) -> Option<DateTime<Utc>> {
        self.last_injected.get(entry_id).copied()
    }

    /// Records an injection of `entry_id` at `at`.
    pub fn mark_injected(&mut self, entry_id: &str, at: DateTime<Utc>) {
        let last = self.last_injected.entry(entry_id.to_string()).or_insert(at);
        if *last < at {
            *last = at;
        }
    }
}

impl<P> Default for EngineState<P> {
    fn default() -> Self {
        Self::new()
    }
}
