//! # Ranker & Quota
//!
//! Orders validated matches and turns them into injection actions:
//!
//! 1. Sort descending by `(priority, score)`; priority first, score breaks ties
//! 2. Keep the first `max_inject_entries`
//! 3. Walk the survivors and drop any whose category already reached its cap
//! 4. Prepend one constant action per constant entry; constants are never capped
//!
//! Dropped matches are reported, never replaced by lower-ranked ones.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use trigger_core::{
    EntryPayload, InjectionAction, Match, MatchConfig, SkipReason, SkippedEntry, TriggerEntry,
};

/// Actions in injection order (constants first), and the matches dropped by caps.
#[derive(Debug)]
pub struct RankOutcome<P> {
    pub actions: Vec<InjectionAction<P>>,
    pub skipped: Vec<SkippedEntry>,
}

/// Sorts matches descending by priority, then score. Stable for full ties.
pub fn sort_matches<P>(matches: &mut [Match<P>]) {
    matches.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| b.score.total_cmp(&a.score))
    });
}

/// Ranks matches and applies the global and per-category caps.
pub fn rank<P: EntryPayload>(
    constants: &[Arc<TriggerEntry<P>>],
    mut matches: Vec<Match<P>>,
    cfg: &MatchConfig,
) -> RankOutcome<P> {
    sort_matches(&mut matches);

    let mut skipped = Vec::new();
    if matches.len() > cfg.max_inject_entries {
        for dropped in matches.drain(cfg.max_inject_entries..) {
            debug!(entry_id = %dropped.entry.id, "dropped by global cap");
            skipped.push(SkippedEntry {
                entry_id: dropped.entry.id.clone(),
                reason: SkipReason::GlobalCap,
            });
        }
    }

    let mut per_category: HashMap<String, usize> = HashMap::new();
    let mut triggered = Vec::with_capacity(matches.len());
    for m in matches {
        let category = m.entry.category().to_string();
        let count = per_category.entry(category.clone()).or_insert(0);
        if let Some(&cap) = cfg.max_per_category.get(&category) {
            if *count >= cap {
                debug!(entry_id = %m.entry.id, category = %category, cap, "dropped by category cap");
                skipped.push(SkippedEntry {
                    entry_id: m.entry.id.clone(),
                    reason: SkipReason::CategoryCap { category },
                });
                continue;
            }
        }
        *count += 1;
        triggered.push(InjectionAction::triggered(
            m.entry,
            m.score,
            cfg.duration_messages,
        ));
    }

    let mut actions: Vec<InjectionAction<P>> = constants
        .iter()
        .filter(|e| e.is_constant)
        .map(|e| InjectionAction::constant(Arc::clone(e)))
        .collect();
    actions.extend(triggered);

    RankOutcome { actions, skipped }
}
