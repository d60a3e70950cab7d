//! # Trigger Engine
//!
//! Owns one [`EngineState`] and runs the pipeline for each incoming message:
//!
//! 1. Prune expired cooldown records
//! 2. Score entries ([`MatchEngine`])
//! 3. Validate matches ([`crate::validator`])
//! 4. Rank and cap ([`crate::ranker`])
//! 5. Render text blocks ([`InjectionBuilder`])
//! 6. Record last-injection times and cooldowns, update stats ([`crate::stats`])
//!
//! Loading fails loudly; processing is fail-soft and returns an empty result on error.
//!
//! ## Concurrency
//!
//! Every mutating operation takes `&mut self`, so one engine has one writer at a time.
//! Share it between tasks as `Arc<tokio::sync::Mutex<TriggerEngine<P>>>` (see
//! [`crate::scheduler`]).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use trigger_core::{
    ConversationContext, CooldownRecord, EngineState, EntryPayload, InjectionResult,
    SimilarityProvider, TriggerConfig, TriggerDebugInfo, TriggerEntry, TriggerError,
    TriggerStats,
};
use trigger_strategies::MatchEngine;

use crate::injection::InjectionBuilder;
use crate::{ranker, stats, validator};

/// Knowledge-entry trigger engine, generic over the entry payload.
pub struct TriggerEngine<P> {
    config: TriggerConfig,
    state: EngineState<P>,
    matcher: MatchEngine,
}

impl<P: EntryPayload> TriggerEngine<P> {
    /// Creates an engine with no entries and no similarity provider.
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            state: EngineState::new(),
            matcher: MatchEngine::new(),
        }
    }

    /// Uses `provider` for the semantic strategy.
    pub fn with_similarity_provider(mut self, provider: Arc<dyn SimilarityProvider>) -> Self {
        self.matcher = MatchEngine::with_similarity_provider(
            provider,
            self.config.matching.semantic_cache_size,
        );
        self
    }

    /// Replaces the loaded corpus.
    ///
    /// Entries are ordered constants first, then by descending priority (stable).
    /// Duplicate ids and non-finite or negative weights are rejected and leave the
    /// previous corpus in place.
    pub fn load_entries(&mut self, entries: Vec<TriggerEntry<P>>) -> Result<usize, TriggerError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(TriggerError::DuplicateEntryId(entry.id.clone()));
            }
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(TriggerError::InvalidEntry {
                    id: entry.id.clone(),
                    reason: format!("weight must be a non-negative number, got {}", entry.weight),
                });
            }
        }

        let mut loaded: Vec<Arc<TriggerEntry<P>>> = entries.into_iter().map(Arc::new).collect();
        loaded.sort_by(|a, b| {
            b.is_constant
                .cmp(&a.is_constant)
                .then_with(|| b.priority.cmp(&a.priority))
        });

        let constant_count = loaded.iter().filter(|e| e.is_constant).count();
        let unmatchable = loaded
            .iter()
            .filter(|e| !e.is_constant && !e.is_matchable())
            .count();
        info!(
            entry_count = loaded.len(),
            constant_count,
            unmatchable,
            "step: load entries done"
        );

        self.state.loaded_entries = loaded;
        self.state.last_updated = Utc::now();
        Ok(self.state.loaded_entries.len())
    }

    /// Runs the pipeline for `ctx` at the current time.
    pub async fn process_message(&mut self, ctx: &ConversationContext) -> InjectionResult<P> {
        self.process_message_at(ctx, Utc::now()).await
    }

    /// Runs the pipeline for `ctx` as of `now`. Never fails: errors yield an empty result.
    #[instrument(
        skip(self, ctx),
        fields(
            entry_count = self.state.loaded_entries.len(),
            history_len = ctx.conversation_history.len()
        )
    )]
    pub async fn process_message_at(
        &mut self,
        ctx: &ConversationContext,
        now: DateTime<Utc>,
    ) -> InjectionResult<P> {
        match self.run_pipeline(ctx, now).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "trigger pipeline failed, returning empty injection");
                InjectionResult::empty()
            }
        }
    }

    async fn run_pipeline(
        &mut self,
        ctx: &ConversationContext,
        now: DateTime<Utc>,
    ) -> Result<InjectionResult<P>, TriggerError> {
        let started = Instant::now();
        let Self {
            config,
            state,
            matcher,
        } = self;
        let cfg = &config.matching;

        prune_expired(state, now);
        let entries = state.loaded_entries.clone();
        let constants: Vec<Arc<TriggerEntry<P>>> =
            entries.iter().filter(|e| e.is_constant).cloned().collect();
        let messages_checked = ctx.windowed_messages(cfg.check_history_length).len();
        let candidates_count = entries
            .iter()
            .filter(|e| !e.is_constant && e.is_matchable())
            .count();
        let parse_time = started.elapsed();

        let stage = Instant::now();
        let matches = matcher.match_entries(&entries, ctx, cfg, now).await?;
        let matched_triggers: Vec<String> = matches.iter().map(|m| m.entry.id.clone()).collect();
        let match_time = stage.elapsed();

        let stage = Instant::now();
        let validated = validator::validate(matches, ctx, state, cfg, now);
        let filter_time = stage.elapsed();

        let stage = Instant::now();
        let ranked = ranker::rank(&constants, validated.accepted, cfg);
        let built = InjectionBuilder::new(&config.injection).build(ranked.actions);
        let injection_time = stage.elapsed();

        let expire_at = now
            .checked_add_signed(cfg.injection_cooldown())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        for action in &built.actions {
            state.mark_injected(&action.entry_id, now);
            if action.temporary {
                state.injection_history.push(CooldownRecord {
                    entry_id: action.entry_id.clone(),
                    injected_at: now,
                    expire_at,
                });
            }
        }

        let mut skipped_entries = validated.skipped;
        skipped_entries.extend(ranked.skipped);

        let injected_count = built.actions.len();
        let debug_info = cfg.debug_mode.then(|| TriggerDebugInfo {
            messages_checked,
            candidates_count,
            matched_triggers,
            skipped_entries: skipped_entries.clone(),
            performance: trigger_core::PerformanceInfo {
                parse_time,
                match_time,
                filter_time,
                injection_time,
            },
        });

        let result = InjectionResult {
            actions: built.actions,
            constant_content: built.constant_content,
            triggered_content: built.triggered_content,
            rendered: built.rendered,
            injected_count,
            skipped_count: skipped_entries.len(),
            duration: started.elapsed(),
            debug_info,
        };

        stats::update(&mut state.stats, &result, now);
        state.last_updated = now;

        info!(
            injected_count = result.injected_count,
            skipped_count = result.skipped_count,
            duration_ms = result.duration.as_millis() as u64,
            "step: process message done"
        );
        Ok(result)
    }

    /// Drops cooldown records with `now > expire_at`; returns how many were dropped.
    pub fn cleanup_expired_history(&mut self, now: DateTime<Utc>) -> usize {
        prune_expired(&mut self.state, now)
    }

    /// Clears all counters.
    pub fn reset_statistics(&mut self) {
        self.state.stats = TriggerStats::default();
        self.state.last_updated = Utc::now();
    }

    /// Replaces the configuration after validating it.
    ///
    /// The similarity cache keeps its capacity until a provider is set again.
    pub fn update_config(&mut self, config: TriggerConfig) -> Result<(), TriggerError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn stats(&self) -> &TriggerStats {
        &self.state.stats
    }

    pub fn state(&self) -> &EngineState<P> {
        &self.state
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn entries(&self) -> &[Arc<TriggerEntry<P>>] {
        &self.state.loaded_entries
    }
}

fn prune_expired<P>(state: &mut EngineState<P>, now: DateTime<Utc>) -> usize {
    let before = state.injection_history.len();
    state.injection_history.retain(|r| now <= r.expire_at);
    let removed = before - state.injection_history.len();
    if removed > 0 {
        debug!(removed, remaining = state.injection_history.len(), "pruned expired cooldowns");
    }
    removed
}
