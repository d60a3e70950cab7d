//! Match type produced by the match engine and consumed by validation and ranking.

use serde::Serialize;
use std::sync::Arc;

use crate::entry::TriggerEntry;

/// Which strategy (or key list) produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Exact or substring hit on a primary key.
    Primary,
    /// Exact or substring hit on a secondary key.
    Secondary,
    Fuzzy,
    Semantic,
    Temporal,
    Emotional,
}

/// A scored candidate entry.
///
/// `score` is the best strategy score in [0, 1] multiplied by the entry's weight.
#[derive(Debug, Clone)]
pub struct Match<P> {
    pub entry: Arc<TriggerEntry<P>>,
    /// Keyword that produced the best score; empty for metadata strategies.
    pub matched_keyword: String,
    pub match_type: MatchType,
    pub score: f64,
    /// Character offsets of the keyword inside the matched message.
    pub positions: Vec<usize>,
    /// Message(s) that produced the best score.
    pub matched_messages: Vec<String>,
}

impl<P> Match<P> {
    pub fn entry_id(&self) -> &str {
        &self.entry.id
    }

    pub fn priority(&self) -> i32 {
        self.entry.priority
    }
}
