//! Raw record → `TriggerEntry` conversion.

use trigger_core::{EntryPayload, RoleMemoryPayload, TriggerEntry, WorldBookPayload};

use crate::records::{RoleMemoryRecord, WorldBookEntry};

/// Adapter from a raw repository record to an engine entry.
pub trait ToTriggerEntry {
    type Payload: EntryPayload;

    fn to_trigger_entry(&self) -> TriggerEntry<Self::Payload>;

    /// Disabled records are skipped at load time.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// # Field mapping
///
/// - `id`: `uid` as text
/// - `primary_keys` / `secondary_keys`: `key` / `keysecondary`
/// - `priority`: `order`
/// - `weight`: `weight`, default 1.0
/// - `payload.comment` / `payload.group`: `comment` / `group`, blank → `None`
///
/// A `malformed` record converts without keys.
impl ToTriggerEntry for WorldBookEntry {
    type Payload = WorldBookPayload;

    fn to_trigger_entry(&self) -> TriggerEntry<WorldBookPayload> {
        let payload = WorldBookPayload {
            comment: non_blank(&self.comment),
            group: non_blank(&self.group),
        };
        let mut entry = TriggerEntry::new(self.uid.to_string(), self.content.clone(), payload)
            .with_primary_keys(self.key.iter().cloned())
            .with_secondary_keys(self.keysecondary.iter().cloned())
            .with_priority(self.order)
            .with_weight(self.weight.unwrap_or(1.0));
        entry.is_constant = self.constant;
        if self.malformed.is_some() {
            return unmatchable(entry);
        }
        entry.match_strategy = self.match_strategy;
        entry.selective_conditions = self.selective_conditions.clone();
        entry.context_requirements = self.context_requirements.clone();
        entry
    }

    fn is_enabled(&self) -> bool {
        !self.disable
    }
}

impl ToTriggerEntry for RoleMemoryRecord {
    type Payload = RoleMemoryPayload;

    fn to_trigger_entry(&self) -> TriggerEntry<RoleMemoryPayload> {
        let mut entry = TriggerEntry::new(
            self.id.clone(),
            self.content.clone(),
            RoleMemoryPayload::new(self.memory_type),
        )
        .with_primary_keys(self.keywords.iter().cloned())
        .with_secondary_keys(self.synonyms.iter().cloned())
        .with_priority(self.priority)
        .with_weight(self.weight.unwrap_or(1.0));
        entry.is_constant = self.is_constant;
        if self.malformed.is_some() {
            return unmatchable(entry);
        }
        entry.timestamp = self.timestamp;
        entry.emotional_context = self.emotional_context.clone();
        entry.emotional_weight = self.emotional_weight;
        entry.time_decay_factor = self.time_decay_factor;
        entry.related_topics = self.related_topics.clone();
        entry
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn unmatchable<P: EntryPayload>(mut entry: TriggerEntry<P>) -> TriggerEntry<P> {
    entry.primary_keys.clear();
    entry.secondary_keys.clear();
    entry
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
