//! # Injection Output
//!
//! Types handed to the prompt-assembly layer: the chosen [`InjectionAction`]s, the
//! rendered constant / triggered text blocks and optional [`TriggerDebugInfo`].

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::entry::TriggerEntry;

/// Whether an action comes from a constant entry or a triggered match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionKind {
    Constant,
    Triggered,
}

/// One entry chosen for injection.
#[derive(Debug, Clone)]
pub struct InjectionAction<P> {
    pub kind: InjectionKind,
    pub entry_id: String,
    /// Rendered text; empty until the injection builder has run.
    pub content: String,
    /// True for triggered entries.
    pub temporary: bool,
    /// TTL in messages; set only when temporary.
    pub duration_messages: Option<u32>,
    pub priority: i32,
    /// Match score for triggered entries.
    pub score: Option<f64>,
    pub entry: Arc<TriggerEntry<P>>,
}

impl<P> InjectionAction<P> {
    pub fn constant(entry: Arc<TriggerEntry<P>>) -> Self {
        Self {
            kind: InjectionKind::Constant,
            entry_id: entry.id.clone(),
            content: String::new(),
            temporary: false,
            duration_messages: None,
            priority: entry.priority,
            score: None,
            entry,
        }
    }

    pub fn triggered(entry: Arc<TriggerEntry<P>>, score: f64, duration_messages: u32) -> Self {
        Self {
            kind: InjectionKind::Triggered,
            entry_id: entry.id.clone(),
            content: String::new(),
            temporary: true,
            duration_messages: Some(duration_messages),
            priority: entry.priority,
            score: Some(score),
            entry,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.kind == InjectionKind::Constant
    }
}

/// Why a matched entry was not injected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Injected too recently.
    Cooldown { remaining_ms: u64 },
    /// A required selective condition did not hold.
    SelectiveCondition { condition: String },
    /// A context requirement did not hold.
    ContextRequirement { requirement: String },
    /// Ranked below the global entry cap.
    GlobalCap,
    /// Its category already reached its cap.
    CategoryCap { category: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Cooldown { remaining_ms } => {
                write!(f, "cooldown ({}ms remaining)", remaining_ms)
            }
            SkipReason::SelectiveCondition { condition } => {
                write!(f, "selective condition failed: {}", condition)
            }
            SkipReason::ContextRequirement { requirement } => {
                write!(f, "context requirement failed: {}", requirement)
            }
            SkipReason::GlobalCap => write!(f, "global entry cap reached"),
            SkipReason::CategoryCap { category } => {
                write!(f, "category cap reached: {}", category)
            }
        }
    }
}

/// A dropped candidate and the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub entry_id: String,
    pub reason: SkipReason,
}

/// Stage timings of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceInfo {
    pub parse_time: Duration,
    pub match_time: Duration,
    pub filter_time: Duration,
    pub injection_time: Duration,
}

/// Diagnostics of one pipeline run; populated in debug mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriggerDebugInfo {
    pub messages_checked: usize,
    pub candidates_count: usize,
    /// Ids of entries that matched before validation.
    pub matched_triggers: Vec<String>,
    pub skipped_entries: Vec<SkippedEntry>,
    pub performance: PerformanceInfo,
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct InjectionResult<P> {
    pub actions: Vec<InjectionAction<P>>,
    pub constant_content: String,
    pub triggered_content: String,
    /// Final prompt text after template substitution; empty when no template is configured.
    pub rendered: String,
    pub injected_count: usize,
    pub skipped_count: usize,
    pub duration: Duration,
    pub debug_info: Option<TriggerDebugInfo>,
}

impl<P> InjectionResult<P> {
    /// Result with no actions and zero counts.
    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            constant_content: String::new(),
            triggered_content: String::new(),
            rendered: String::new(),
            injected_count: 0,
            skipped_count: 0,
            duration: Duration::ZERO,
            debug_info: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn constant_actions(&self) -> impl Iterator<Item = &InjectionAction<P>> {
        self.actions.iter().filter(|a| a.is_constant())
    }

    pub fn triggered_actions(&self) -> impl Iterator<Item = &InjectionAction<P>> {
        self.actions.iter().filter(|a| !a.is_constant())
    }
}

impl<P> Default for InjectionResult<P> {
    fn default() -> Self {
        Self::empty()
    }
}
