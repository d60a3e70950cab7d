//! # Entry Payloads
//!
//! World-book lore and role memories share one engine. What differs between them is
//! carried by an [`EntryPayload`]: the category an entry is counted under for
//! per-category caps, the localized heading of that category, and an optional title.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::config::Locale;

/// Category-specific data attached to a [`crate::TriggerEntry`].
pub trait EntryPayload: Debug + Clone + Send + Sync + 'static {
    /// Key used for per-category caps (e.g. `"lore"`, `"fact"`).
    fn category(&self) -> &str;

    /// Human-readable heading for the category, used when grouping injected content.
    fn category_label(&self, locale: Locale) -> String;

    /// Display title, if the entry carries one.
    fn title(&self) -> Option<&str> {
        None
    }
}

/// Payload of a world-book (lore) entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBookPayload {
    /// Author's comment; doubles as the entry title.
    pub comment: Option<String>,
    /// Inclusion group; used as category when set.
    pub group: Option<String>,
}

impl WorldBookPayload {
    pub const DEFAULT_CATEGORY: &'static str = "lore";

    pub fn with_comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            group: None,
        }
    }
}

impl EntryPayload for WorldBookPayload {
    fn category(&self) -> &str {
        self.group
            .as_deref()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or(Self::DEFAULT_CATEGORY)
    }

    fn category_label(&self, locale: Locale) -> String {
        match self.group.as_deref().filter(|g| !g.trim().is_empty()) {
            Some(group) => group.to_string(),
            None => match locale {
                Locale::En => "World Info".to_string(),
                Locale::Zh => "世界书".to_string(),
            },
        }
    }

    fn title(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// Kind of a role memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Fact,
    Event,
    Relationship,
    Preference,
    Emotion,
    #[default]
    #[serde(other)]
    Other,
}

impl MemoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryType::Fact => "fact",
            MemoryType::Event => "event",
            MemoryType::Relationship => "relationship",
            MemoryType::Preference => "preference",
            MemoryType::Emotion => "emotion",
            MemoryType::Other => "other",
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, MemoryType::Fact) => "Facts",
            (Locale::En, MemoryType::Event) => "Events",
            (Locale::En, MemoryType::Relationship) => "Relationships",
            (Locale::En, MemoryType::Preference) => "Preferences",
            (Locale::En, MemoryType::Emotion) => "Emotions",
            (Locale::En, MemoryType::Other) => "Other Memories",
            (Locale::Zh, MemoryType::Fact) => "事实",
            (Locale::Zh, MemoryType::Event) => "事件",
            (Locale::Zh, MemoryType::Relationship) => "关系",
            (Locale::Zh, MemoryType::Preference) => "偏好",
            (Locale::Zh, MemoryType::Emotion) => "情感",
            (Locale::Zh, MemoryType::Other) => "其他记忆",
        }
    }
}

/// Payload of a role-memory record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMemoryPayload {
    pub memory_type: MemoryType,
}

impl RoleMemoryPayload {
    pub fn new(memory_type: MemoryType) -> Self {
        Self { memory_type }
    }
}

impl EntryPayload for RoleMemoryPayload {
    fn category(&self) -> &str {
        self.memory_type.as_str()
    }

    fn category_label(&self, locale: Locale) -> String {
        self.memory_type.label(locale).to_string()
    }
}
