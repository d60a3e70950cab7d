//! Trigger configuration: matching, injection rendering and real-time scheduling.
//!
//! All sections deserialize with defaults, and [`TriggerConfig::from_env`] overlays
//! `TRIGGER_*` environment variables on top of them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::TriggerError;

/// Text strategy used to score keywords against messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Whole message equals the keyword.
    Exact,
    /// Message contains the keyword.
    #[default]
    Contains,
    /// Normalized edit-distance similarity.
    Fuzzy,
    /// External similarity provider.
    Semantic,
    /// All of the above; semantic only when a provider is configured.
    Hybrid,
}

impl FromStr for MatchStrategy {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchStrategy::Exact),
            "contains" => Ok(MatchStrategy::Contains),
            "fuzzy" => Ok(MatchStrategy::Fuzzy),
            "semantic" => Ok(MatchStrategy::Semantic),
            "hybrid" => Ok(MatchStrategy::Hybrid),
            other => Err(TriggerError::Config(format!(
                "unknown match strategy: {}",
                other
            ))),
        }
    }
}

/// Language of generated labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl FromStr for Locale {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "zh" | "zh-cn" => Ok(Locale::Zh),
            other => Err(TriggerError::Config(format!("unknown locale: {}", other))),
        }
    }
}

/// Matching, validation and ranking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub match_strategy: MatchStrategy,
    pub case_sensitive: bool,
    pub fuzzy_threshold: f64,
    pub semantic_threshold: f64,
    /// History messages scanned in addition to the current message.
    pub check_history_length: usize,
    pub max_inject_entries: usize,
    /// Minimum time between two injections of the same entry, in milliseconds.
    pub injection_cooldown_ms: u64,
    pub debug_mode: bool,
    pub enable_temporal: bool,
    pub enable_emotional: bool,
    /// Decay used for entries with a timestamp but no own decay factor (per day).
    pub default_time_decay: f64,
    /// Per-category caps; categories not listed are uncapped.
    pub max_per_category: HashMap<String, usize>,
    /// TTL of triggered injections, in messages.
    pub duration_messages: u32,
    /// Capacity of the semantic score cache.
    pub semantic_cache_size: usize,
}

impl MatchConfig {
    /// Values beyond `i64::MAX` milliseconds saturate.
    pub fn injection_cooldown(&self) -> chrono::Duration {
        let ms = i64::try_from(self.injection_cooldown_ms).unwrap_or(i64::MAX);
        chrono::Duration::milliseconds(ms)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_strategy: MatchStrategy::Contains,
            case_sensitive: false,
            fuzzy_threshold: 0.8,
            semantic_threshold: 0.7,
            check_history_length: 5,
            max_inject_entries: 10,
            injection_cooldown_ms: 30_000,
            debug_mode: false,
            enable_temporal: false,
            enable_emotional: false,
            default_time_decay: 0.1,
            max_per_category: HashMap::new(),
            duration_messages: 5,
            semantic_cache_size: 1024,
        }
    }
}

/// Rendering of injection text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Joins blocks of the same kind.
    pub separator: String,
    /// Group triggered blocks under category headings.
    pub separate_by_type: bool,
    /// Final template with `{{content}}`, `{{constantContent}}`, `{{triggeredContent}}`.
    pub template: Option<String>,
    pub include_timestamp: bool,
    pub include_keywords: bool,
    pub locale: Locale,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            separator: "\n\n---\n\n".to_string(),
            separate_by_type: false,
            template: None,
            include_timestamp: false,
            include_keywords: true,
            locale: Locale::En,
        }
    }
}

/// Debounced streaming invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealTimeOptions {
    pub enabled: bool,
    pub debounce_delay_ms: u64,
    pub min_trigger_interval_ms: u64,
    pub allow_concurrent: bool,
}

impl RealTimeOptions {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    pub fn min_trigger_interval(&self) -> Duration {
        Duration::from_millis(self.min_trigger_interval_ms)
    }
}

impl Default for RealTimeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_delay_ms: 300,
            min_trigger_interval_ms: 1000,
            allow_concurrent: false,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub matching: MatchConfig,
    pub injection: InjectionConfig,
    pub realtime: RealTimeOptions,
}

impl TriggerConfig {
    /// Defaults overlaid with `TRIGGER_*` environment variables.
    ///
    /// Unset variables keep their defaults; unparsable values are an error.
    pub fn from_env() -> Result<Self, TriggerError> {
        let mut config = Self::default();
        let m = &mut config.matching;
        if let Some(v) = env_parse::<MatchStrategy>("TRIGGER_MATCH_STRATEGY")? {
            m.match_strategy = v;
        }
        if let Some(v) = env_parse("TRIGGER_CASE_SENSITIVE")? {
            m.case_sensitive = v;
        }
        if let Some(v) = env_parse("TRIGGER_FUZZY_THRESHOLD")? {
            m.fuzzy_threshold = v;
        }
        if let Some(v) = env_parse("TRIGGER_SEMANTIC_THRESHOLD")? {
            m.semantic_threshold = v;
        }
        if let Some(v) = env_parse("TRIGGER_HISTORY_LENGTH")? {
            m.check_history_length = v;
        }
        if let Some(v) = env_parse("TRIGGER_MAX_ENTRIES")? {
            m.max_inject_entries = v;
        }
        if let Some(v) = env_parse("TRIGGER_COOLDOWN_MS")? {
            m.injection_cooldown_ms = v;
        }
        if let Some(v) = env_parse("TRIGGER_DEBUG")? {
            m.debug_mode = v;
        }

        let i = &mut config.injection;
        if let Some(v) = env_parse("TRIGGER_SEPARATE_BY_TYPE")? {
            i.separate_by_type = v;
        }
        if let Some(v) = env_parse::<Locale>("TRIGGER_LOCALE")? {
            i.locale = v;
        }

        let r = &mut config.realtime;
        if let Some(v) = env_parse("TRIGGER_DEBOUNCE_MS")? {
            r.debounce_delay_ms = v;
        }
        if let Some(v) = env_parse("TRIGGER_MIN_INTERVAL_MS")? {
            r.min_trigger_interval_ms = v;
        }
        if let Some(v) = env_parse("TRIGGER_ALLOW_CONCURRENT")? {
            r.allow_concurrent = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks thresholds are within [0, 1].
    pub fn validate(&self) -> Result<(), TriggerError> {
        let m = &self.matching;
        for (name, value) in [
            ("fuzzy_threshold", m.fuzzy_threshold),
            ("semantic_threshold", m.semantic_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TriggerError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !m.default_time_decay.is_finite() || m.default_time_decay < 0.0 {
            return Err(TriggerError::Config(format!(
                "default_time_decay must be a non-negative number, got {}",
                m.default_time_decay
            )));
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, TriggerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TriggerError::Config(format!("{}={}: {}", key, raw, e))),
        _ => Ok(None),
    }
}
