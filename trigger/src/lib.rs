//! # trigger
//!
//! Contextual knowledge-entry injection for chat prompts.
//!
//! A [`TriggerEngine`] holds a corpus of [`TriggerEntry`] values (world-book lore or role
//! memories) and, for each incoming [`ConversationContext`], decides which entries to splice
//! into the prompt:
//!
//! ```text
//! match (trigger-strategies) → validator → ranker → injection → stats
//! ```
//!
//! [`RealTimeScheduler`] debounces streaming input in front of the engine.
//!
//! ## Example
//!
//! ```no_run
//! use trigger::{ConversationContext, TriggerConfig, TriggerEngine, TriggerEntry, WorldBookPayload};
//!
//! # async fn run() -> Result<(), trigger::TriggerError> {
//! let mut engine = TriggerEngine::new(TriggerConfig::default());
//! engine.load_entries(vec![
//!     TriggerEntry::new("1", "Dragons hoard gold.", WorldBookPayload::with_comment("Dragons"))
//!         .with_primary_keys(["dragon"]),
//! ])?;
//! let result = engine
//!     .process_message(&ConversationContext::new("I see a dragon today"))
//!     .await;
//! println!("{}", result.triggered_content);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod injection;
pub mod logger;
pub mod ranker;
pub mod scheduler;
pub mod stats;
pub mod validator;

pub use engine::TriggerEngine;
pub use injection::{BuiltInjection, InjectionBuilder};
pub use scheduler::{RealTimeScheduler, SchedulerState, SharedEngine};

pub use trigger_core::{
    ConditionOperator, ConditionType, ContextRequirement, ConversationContext, EntryPayload,
    HistoryMessage, InjectionAction, InjectionConfig, InjectionKind, InjectionResult, Locale,
    MatchConfig, MatchStrategy, MemoryType, MessageRole, RealTimeOptions, RequirementOperator,
    RequirementType, RoleMemoryPayload, SelectiveCondition, SimilarityProvider, SkipReason,
    SkippedEntry, TriggerConfig, TriggerEntry, TriggerError, TriggerStats, WorldBookPayload,
};
