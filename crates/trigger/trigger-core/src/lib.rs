//! # trigger-core
//!
//! Core types and traits for contextual knowledge-entry triggering: [`TriggerEntry`],
//! [`ConversationContext`], [`Match`], [`InjectionAction`] / [`InjectionResult`],
//! [`EngineState`], configuration, and the [`SimilarityProvider`] seam.
//!
//! World-book lore and role memories are the same [`TriggerEntry`] with a different
//! [`EntryPayload`]; every stage of the pipeline is generic over the payload.
//!
//! ## External Interactions
//!
//! - **trigger-strategies**: scores entries against a context
//! - **trigger**: validation, ranking, rendering, stats and scheduling
//! - **trigger-loader**: converts raw world-book / memory records into entries

pub mod config;
pub mod context;
pub mod entry;
pub mod error;
pub mod matching;
pub mod payload;
pub mod result;
pub mod similarity;
pub mod state;

pub use config::{InjectionConfig, Locale, MatchConfig, MatchStrategy, RealTimeOptions, TriggerConfig};
pub use context::{ConversationContext, HistoryMessage, MessageRole};
pub use entry::{
    ConditionOperator, ConditionType, ContextRequirement, RequirementOperator, RequirementType,
    SelectiveCondition, TriggerEntry,
};
pub use error::{Result, TriggerError};
pub use matching::{Match, MatchType};
pub use payload::{EntryPayload, MemoryType, RoleMemoryPayload, WorldBookPayload};
pub use result::{
    InjectionAction, InjectionKind, InjectionResult, PerformanceInfo, SkipReason, SkippedEntry,
    TriggerDebugInfo,
};
pub use similarity::SimilarityProvider;
pub use state::{CooldownRecord, EngineState, PopularEntry, TriggerStats};
