//! Metadata strategies: scores derived from entry metadata rather than message text.

use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// `exp(-age_days * decay)`; future timestamps count as age 0.
pub fn temporal_score(timestamp: DateTime<Utc>, now: DateTime<Utc>, decay: f64) -> f64 {
    let age_days = ((now - timestamp).num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0);
    (-age_days * decay.max(0.0)).exp()
}

/// Emotional weight (clamped to [0, 1], default 1) when the entry's emotional context
/// equals the conversation's emotional state, ignoring case; 0 otherwise.
pub fn emotional_score(
    entry_emotion: Option<&str>,
    state: Option<&str>,
    emotional_weight: Option<f64>,
) -> f64 {
    match (entry_emotion, state) {
        (Some(entry), Some(state))
            if !entry.trim().is_empty()
                && entry.trim().to_lowercase() == state.trim().to_lowercase() =>
        {
            emotional_weight.unwrap_or(1.0).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn temporal_decays_with_age() {
        let now = Utc::now();
        assert!((temporal_score(now, now, 0.5) - 1.0).abs() < 1e-9);
        let two_days = temporal_score(now - Duration::days(2), now, 0.5);
        assert!((two_days - (-1.0f64).exp()).abs() < 1e-9);
        assert!((temporal_score(now + Duration::days(3), now, 0.5) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn emotional_requires_equal_state() {
        assert_eq!(emotional_score(Some("Sad"), Some("sad"), None), 1.0);
        assert_eq!(emotional_score(Some("sad"), Some("sad"), Some(0.4)), 0.4);
        assert_eq!(emotional_score(Some("sad"), Some("happy"), None), 0.0);
        assert_eq!(emotional_score(None, Some("sad"), None), 0.0);
        assert_eq!(emotional_score(Some("sad"), Some("sad"), Some(3.0)), 1.0);
        assert_eq!(emotional_score(Some("ÄRGER"), Some("ärger"), None), 1.0);
    }
}
