//! Semantic strategy: delegates to a [`SimilarityProvider`] and caches its scores.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use trigger_core::{SimilarityProvider, TriggerError};

/// Bounded cache of similarity scores keyed by `(message, keyword)`.
///
/// When full, the cache is cleared before the next insert.
#[derive(Debug)]
pub struct SimilarityCache {
    scores: RwLock<HashMap<(String, String), f64>>,
    capacity: usize,
}

impl SimilarityCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub async fn get(&self, message: &str, keyword: &str) -> Option<f64> {
        let scores = self.scores.read().await;
        scores
            .get(&(message.to_string(), keyword.to_string()))
            .copied()
    }

    pub async fn insert(&self, message: &str, keyword: &str, score: f64) {
        if self.capacity == 0 {
            return;
        }
        let mut scores = self.scores.write().await;
        if scores.len() >= self.capacity {
            debug!(capacity = self.capacity, "semantic cache full, clearing");
            scores.clear();
        }
        scores.insert((message.to_string(), keyword.to_string()), score);
    }

    pub async fn len(&self) -> usize {
        self.scores.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.scores.write().await.clear();
    }
}

/// Provider plus cache.
pub struct SemanticScorer {
    provider: Arc<dyn SimilarityProvider>,
    cache: SimilarityCache,
}

impl SemanticScorer {
    pub fn new(provider: Arc<dyn SimilarityProvider>, cache_capacity: usize) -> Self {
        Self {
            provider,
            cache: SimilarityCache::new(cache_capacity),
        }
    }

    /// Provider similarity clamped to [0, 1], or 0 when below `threshold`.
    pub async fn score(
        &self,
        message: &str,
        keyword: &str,
        threshold: f64,
    ) -> Result<f64, TriggerError> {
        let similarity = match self.cache.get(message, keyword).await {
            Some(cached) => cached,
            None => {
                let raw = self
                    .provider
                    .similarity(message, keyword)
                    .await
                    .map_err(TriggerError::Similarity)?;
                let clamped = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };
                self.cache.insert(message, keyword, clamped).await;
                clamped
            }
        };
        Ok(if similarity >= threshold { similarity } else { 0.0 })
    }

    pub fn cache(&self) -> &SimilarityCache {
        &self.cache
    }
}
