//! Similarity provider interface used by the semantic strategy.

use async_trait::async_trait;

/// Service that scores how close two texts are in meaning.
///
/// Implementations typically wrap an embedding API; scores are expected in [0, 1].
/// The engine caches results by `(message, keyword)`, so implementations need not.
#[async_trait]
pub trait SimilarityProvider: Send + Sync {
    async fn similarity(&self, a: &str, b: &str) -> Result<f64, anyhow::Error>;
}
