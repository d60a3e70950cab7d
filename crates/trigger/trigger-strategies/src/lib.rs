//! # Match Strategies
//!
//! This crate scores knowledge entries against a conversation.
//!
//! Available strategies:
//! - `exact`: whole message equals a keyword (1.0)
//! - `contains`: message contains a keyword (0.8)
//! - `fuzzy`: Levenshtein similarity above `fuzzy_threshold`
//! - `semantic`: external [`trigger_core::SimilarityProvider`] above `semantic_threshold`, cached
//! - `temporal`: `exp(-age_days * decay)` from the entry timestamp
//! - `emotional`: entry emotional context equals the conversation's emotional state
//!
//! [`MatchEngine`] combines the enabled strategies by taking the maximum, then applies
//! the entry weight.
//!
//! ## Logging
//!
//! The engine emits `tracing` logs: an `info` summary per run and `debug` lines per
//! matched or weighted-out entry.

mod engine;
pub mod metadata;
pub mod semantic;
pub mod text;

pub use engine::MatchEngine;
pub use semantic::{SemanticScorer, SimilarityCache};
pub use text::{fuzzy_similarity, levenshtein_distance};
