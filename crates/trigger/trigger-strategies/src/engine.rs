//! Match engine: scores every non-constant entry against the windowed conversation.
//!
//! For each entry the best score over all keyword/message pairs and all enabled
//! strategies is kept (max, not sum), then multiplied by the entry weight. Ties keep the
//! first candidate found, and candidates are visited primary keys first, then secondary
//! keys; within each, earliest message first.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use trigger_core::{
    ConversationContext, EntryPayload, Match, MatchConfig, MatchStrategy, MatchType,
    SimilarityProvider, TriggerEntry, TriggerError,
};

use crate::metadata::{emotional_score, temporal_score};
use crate::semantic::SemanticScorer;
use crate::text::{contains_score, exact_score, fuzzy_score, normalize};

/// Best candidate found so far for one entry.
struct Candidate {
    score: f64,
    keyword: String,
    match_type: MatchType,
    positions: Vec<usize>,
    message: Option<String>,
}

impl Candidate {
    fn offer(best: &mut Option<Candidate>, candidate: Candidate) {
        let better = match best {
            Some(current) => candidate.score > current.score,
            None => candidate.score > 0.0,
        };
        if better {
            *best = Some(candidate);
        }
    }
}

/// Scores entries against a conversation context.
pub struct MatchEngine {
    semantic: Option<SemanticScorer>,
}

impl MatchEngine {
    /// Engine without a similarity provider; semantic scoring yields 0.
    pub fn new() -> Self {
        Self { semantic: None }
    }

    /// Engine whose semantic strategy delegates to `provider`, caching up to
    /// `cache_capacity` scores.
    pub fn with_similarity_provider(
        provider: Arc<dyn SimilarityProvider>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            semantic: Some(SemanticScorer::new(provider, cache_capacity)),
        }
    }

    pub fn has_similarity_provider(&self) -> bool {
        self.semantic.is_some()
    }

    pub fn semantic_scorer(&self) -> Option<&SemanticScorer> {
        self.semantic.as_ref()
    }

    /// Returns one match per entry whose weighted score is positive, in input order.
    ///
    /// Constant and keyless entries are never candidates. Errors only come from the
    /// similarity provider.
    pub async fn match_entries<P: EntryPayload>(
        &self,
        entries: &[Arc<TriggerEntry<P>>],
        ctx: &ConversationContext,
        cfg: &MatchConfig,
        now: DateTime<Utc>,
    ) -> Result<Vec<Match<P>>, TriggerError> {
        let messages: Vec<String> = ctx
            .windowed_messages(cfg.check_history_length)
            .into_iter()
            .map(|m| normalize(m, cfg.case_sensitive))
            .collect();

        let mut matches = Vec::new();
        for entry in entries.iter().filter(|e| !e.is_constant) {
            if let Some(m) = self.score_entry(entry, &messages, ctx, cfg, now).await? {
                matches.push(m);
            }
        }

        info!(
            entry_count = entries.len(),
            message_count = messages.len(),
            match_count = matches.len(),
            "step: match entries done"
        );
        Ok(matches)
    }

    /// Scores a single entry against already windowed and normalized messages.
    pub async fn score_entry<P: EntryPayload>(
        &self,
        entry: &Arc<TriggerEntry<P>>,
        messages: &[String],
        ctx: &ConversationContext,
        cfg: &MatchConfig,
        now: DateTime<Utc>,
    ) -> Result<Option<Match<P>>, TriggerError> {
        if !entry.is_matchable() {
            return Ok(None);
        }
        let strategy = entry.match_strategy.unwrap_or(cfg.match_strategy);
        let mut best: Option<Candidate> = None;

        let key_groups = [
            (&entry.primary_keys, MatchType::Primary),
            (&entry.secondary_keys, MatchType::Secondary),
        ];
        for (keys, key_type) in key_groups {
            for message in messages {
                for keyword in keys.iter().filter(|k| !k.trim().is_empty()) {
                    let keyword = normalize(keyword, cfg.case_sensitive);
                    self.score_pair(message, &keyword, key_type, strategy, cfg, &mut best)
                        .await?;
                }
            }
        }

        if cfg.enable_temporal {
            if let Some(timestamp) = entry.timestamp {
                let decay = entry.time_decay_factor.unwrap_or(cfg.default_time_decay);
                Candidate::offer(
                    &mut best,
                    Candidate {
                        score: temporal_score(timestamp, now, decay),
                        keyword: String::new(),
                        match_type: MatchType::Temporal,
                        positions: Vec::new(),
                        message: None,
                    },
                );
            }
        }

        if cfg.enable_emotional {
            Candidate::offer(
                &mut best,
                Candidate {
                    score: emotional_score(
                        entry.emotional_context.as_deref(),
                        ctx.emotional_state.as_deref(),
                        entry.emotional_weight,
                    ),
                    keyword: String::new(),
                    match_type: MatchType::Emotional,
                    positions: Vec::new(),
                    message: None,
                },
            );
        }

        let Some(best) = best else {
            return Ok(None);
        };
        let score = best.score * entry.weight;
        if score <= 0.0 || !score.is_finite() {
            debug!(entry_id = %entry.id, raw_score = best.score, weight = entry.weight, "entry weighted out");
            return Ok(None);
        }

        debug!(
            entry_id = %entry.id,
            keyword = %best.keyword,
            match_type = ?best.match_type,
            score,
            "entry matched"
        );
        Ok(Some(Match {
            entry: Arc::clone(entry),
            matched_keyword: best.keyword,
            match_type: best.match_type,
            score,
            positions: best.positions,
            matched_messages: best.message.into_iter().collect(),
        }))
    }

    async fn score_pair(
        &self,
        message: &str,
        keyword: &str,
        key_type: MatchType,
        strategy: MatchStrategy,
        cfg: &MatchConfig,
        best: &mut Option<Candidate>,
    ) -> Result<(), TriggerError> {
        let candidate = |score: f64, match_type: MatchType, positions: Vec<usize>| Candidate {
            score,
            keyword: keyword.to_string(),
            match_type,
            positions,
            message: Some(message.to_string()),
        };

        if matches!(strategy, MatchStrategy::Exact | MatchStrategy::Hybrid) {
            let score = exact_score(message, keyword);
            Candidate::offer(best, candidate(score, key_type, vec![0]));
        }
        if matches!(strategy, MatchStrategy::Contains | MatchStrategy::Hybrid) {
            let (score, positions) = contains_score(message, keyword);
            Candidate::offer(best, candidate(score, key_type, positions));
        }
        if matches!(strategy, MatchStrategy::Fuzzy | MatchStrategy::Hybrid) {
            let score = fuzzy_score(message, keyword, cfg.fuzzy_threshold);
            Candidate::offer(best, candidate(score, MatchType::Fuzzy, Vec::new()));
        }
        if matches!(strategy, MatchStrategy::Semantic | MatchStrategy::Hybrid) {
            if let Some(scorer) = &self.semantic {
                let score = scorer
                    .score(message, keyword, cfg.semantic_threshold)
                    .await?;
                Candidate::offer(best, candidate(score, MatchType::Semantic, Vec::new()));
            }
        }
        Ok(())
    }
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}
