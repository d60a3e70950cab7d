//! # Trigger Entries
//!
//! A [`TriggerEntry`] is one unit of injectable knowledge: a world-book lore entry or a
//! role-memory record. The fields shared by every kind of entry live here; whatever is
//! specific to one kind travels in the `payload` (see [`crate::payload`]).
//!
//! Entries are immutable after load. The engine only ever holds them behind `Arc`.
//!
//! ## Matchability
//!
//! An entry with no primary and no secondary keys can never be matched. It is still
//! injected when it is constant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MatchStrategy;
use crate::payload::EntryPayload;

/// Kind of a selective condition.
///
/// Unknown kinds deserialize to [`ConditionType::Custom`] and always pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    /// Value must be present among the context keywords.
    Tag,
    /// A character (assistant-side speaker) with this name took part in the conversation.
    Character,
    /// A user with this name took part in the conversation.
    User,
    /// The current topic / scenario of the conversation.
    Scenario,
    /// Host-defined condition; not evaluated.
    #[serde(other)]
    Custom,
}

/// Comparison used by a selective condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
}

/// A condition that gates an otherwise matching entry.
///
/// Only `required` conditions are enforced; the others are informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectiveCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub value: String,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default)]
    pub required: bool,
}

/// Kind of a context requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    /// History length lower bound.
    MinMessages,
    /// History length upper bound.
    MaxMessages,
    /// Milliseconds elapsed since this entry was last injected.
    TimeSinceLast,
    /// Role of the most recent history message.
    UserRole,
    /// Current conversation topic.
    ConversationTopic,
}

impl RequirementType {
    /// Operator applied when the requirement does not name one.
    pub fn default_operator(self) -> RequirementOperator {
        match self {
            RequirementType::MinMessages | RequirementType::TimeSinceLast => {
                RequirementOperator::Gte
            }
            RequirementType::MaxMessages => RequirementOperator::Lte,
            RequirementType::UserRole => RequirementOperator::Eq,
            RequirementType::ConversationTopic => RequirementOperator::Contains,
        }
    }
}

/// Comparison used by a context requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementOperator {
    Gte,
    Lte,
    Eq,
    Ne,
    Contains,
}

/// A requirement on the conversation state that must hold for the entry to be injected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRequirement {
    #[serde(rename = "type")]
    pub requirement_type: RequirementType,
    /// Numeric requirements carry their number as text (e.g. `"3"`).
    pub value: String,
    #[serde(default)]
    pub operator: Option<RequirementOperator>,
}

impl ContextRequirement {
    /// The explicit operator, or the default one for this requirement type.
    pub fn effective_operator(&self) -> RequirementOperator {
        self.operator
            .unwrap_or_else(|| self.requirement_type.default_operator())
    }
}

/// A knowledge unit that can be matched against a conversation and injected into a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEntry<P> {
    /// Stable identifier, unique within one loaded corpus.
    pub id: String,
    pub primary_keys: Vec<String>,
    pub secondary_keys: Vec<String>,
    /// Always injected; never a matching candidate.
    pub is_constant: bool,
    /// Higher wins ties.
    pub priority: i32,
    /// Multiplier applied to raw strategy scores.
    pub weight: f64,
    pub selective_conditions: Vec<SelectiveCondition>,
    pub context_requirements: Vec<ContextRequirement>,
    /// Body text.
    pub content: String,
    /// Overrides the configured strategy for this entry only.
    pub match_strategy: Option<MatchStrategy>,
    pub emotional_context: Option<String>,
    pub related_topics: Vec<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub time_decay_factor: Option<f64>,
    pub emotional_weight: Option<f64>,
    /// Category-specific data.
    pub payload: P,
}

impl<P: EntryPayload> TriggerEntry<P> {
    /// Creates an entry with default weight (1.0) and no keys, conditions or metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>, payload: P) -> Self {
        Self {
            id: id.into(),
            primary_keys: Vec::new(),
            secondary_keys: Vec::new(),
            is_constant: false,
            priority: 0,
            weight: 1.0,
            selective_conditions: Vec::new(),
            context_requirements: Vec::new(),
            content: content.into(),
            match_strategy: None,
            emotional_context: None,
            related_topics: Vec::new(),
            timestamp: None,
            time_decay_factor: None,
            emotional_weight: None,
            payload,
        }
    }

    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_secondary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_constant = true;
        self
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.match_strategy = Some(strategy);
        self
    }

    pub fn with_condition(mut self, condition: SelectiveCondition) -> Self {
        self.selective_conditions.push(condition);
        self
    }

    pub fn with_requirement(mut self, requirement: ContextRequirement) -> Self {
        self.context_requirements.push(requirement);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_emotional_context(mut self, emotion: impl Into<String>) -> Self {
        self.emotional_context = Some(emotion.into());
        self
    }

    /// True if the entry has at least one non-blank key.
    pub fn is_matchable(&self) -> bool {
        self.primary_keys
            .iter()
            .chain(self.secondary_keys.iter())
            .any(|k| !k.trim().is_empty())
    }

    /// Category used for per-category caps.
    pub fn category(&self) -> &str {
        self.payload.category()
    }

    /// Display title: payload title, else the first primary key, else `entry #<id>`.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.payload.title().filter(|t| !t.trim().is_empty()) {
            return title.to_string();
        }
        if let Some(key) = self.primary_keys.iter().find(|k| !k.trim().is_empty()) {
            return key.clone();
        }
        format!("entry #{}", self.id)
    }
}
