//! Raw record shapes as found in world-book and role-memory JSON files.
//!
//! World-book files come in three layouts: a bare array of entries, `{"entries": [...]}`,
//! or `{"entries": {"<uid>": {...}}}`. All three parse into `Vec<WorldBookEntry>` ordered by uid.
//!
//! Records are parsed one at a time. A record whose fields do not parse (an unknown
//! requirement type, a textual `order`) is kept with only its identity, body and flags,
//! and marked `malformed`. It converts to an entry without keys, so it is never matched but
//! is still injected when constant.

use std::fmt;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use trigger_core::{ContextRequirement, MatchStrategy, MemoryType, SelectiveCondition};

/// Entry identifier; numeric in most world-book exports, text elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryUid {
    Number(i64),
    Text(String),
}

impl Default for EntryUid {
    fn default() -> Self {
        EntryUid::Number(0)
    }
}

impl fmt::Display for EntryUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryUid::Number(n) => write!(f, "{}", n),
            EntryUid::Text(s) => f.write_str(s),
        }
    }
}

/// One world-book (lore) entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBookEntry {
    pub uid: EntryUid,
    #[serde(deserialize_with = "key_list")]
    pub key: Vec<String>,
    #[serde(deserialize_with = "key_list")]
    pub keysecondary: Vec<String>,
    pub comment: String,
    pub content: String,
    pub constant: bool,
    #[serde(alias = "priority")]
    pub order: i32,
    pub disable: bool,
    pub group: String,
    pub weight: Option<f64>,
    pub match_strategy: Option<MatchStrategy>,
    pub selective_conditions: Vec<SelectiveCondition>,
    pub context_requirements: Vec<ContextRequirement>,
    /// Parse error of the original record, if any.
    #[serde(skip)]
    pub malformed: Option<String>,
}

/// One role-memory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleMemoryRecord {
    pub id: String,
    #[serde(default)]
    pub memory_type: MemoryType,
    #[serde(default, deserialize_with = "key_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "key_list")]
    pub synonyms: Vec<String>,
    pub content: String,
    #[serde(default, alias = "importance")]
    pub priority: i32,
    #[serde(default)]
    pub is_constant: bool,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub emotional_context: Option<String>,
    #[serde(default)]
    pub emotional_weight: Option<f64>,
    #[serde(default)]
    pub time_decay_factor: Option<f64>,
    #[serde(default)]
    pub related_topics: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(skip)]
    pub malformed: Option<String>,
}

fn enabled_default() -> bool {
    true
}

/// Accepts either a JSON array of strings or one comma-separated string.
fn key_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keys {
        List(Vec<String>),
        Joined(String),
    }

    let keys = match Keys::deserialize(deserializer)? {
        Keys::List(list) => list,
        Keys::Joined(joined) => joined.split(',').map(str::to_string).collect(),
    };
    Ok(keys
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect())
}

/// Parses a world-book JSON document in any supported layout.
pub fn parse_world_book(json: &str) -> anyhow::Result<Vec<WorldBookEntry>> {
    let doc: Value = serde_json::from_str(json).context("Failed to parse world-book JSON")?;
    let records: Vec<(String, Value)> = match doc {
        Value::Array(list) => indexed(list),
        Value::Object(mut root) => match root.remove("entries") {
            Some(Value::Array(list)) => indexed(list),
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => bail!("Failed to parse world-book JSON: expected an entry array or map"),
        },
        _ => bail!("Failed to parse world-book JSON: expected an entry array or map"),
    };

    let mut entries: Vec<WorldBookEntry> = records
        .into_iter()
        .map(|(slot, value)| parse_world_book_entry(&slot, value))
        .collect();
    entries.sort_by(|a, b| a.uid.cmp(&b.uid));
    Ok(entries)
}

/// Parses a JSON array of role-memory records.
pub fn parse_role_memories(json: &str) -> anyhow::Result<Vec<RoleMemoryRecord>> {
    let doc: Value = serde_json::from_str(json).context("Failed to parse role-memory JSON")?;
    let Value::Array(list) = doc else {
        bail!("Failed to parse role-memory JSON: expected an array of records");
    };
    Ok(indexed(list)
        .into_iter()
        .map(|(slot, value)| parse_role_memory(&slot, value))
        .collect())
}

fn indexed(list: Vec<Value>) -> Vec<(String, Value)> {
    list.into_iter()
        .enumerate()
        .map(|(i, v)| (i.to_string(), v))
        .collect()
}

fn parse_world_book_entry(slot: &str, value: Value) -> WorldBookEntry {
    match WorldBookEntry::deserialize(&value) {
        Ok(entry) => entry,
        Err(e) => {
            let uid = value
                .get("uid")
                .and_then(|v| match v {
                    Value::String(s) => Some(EntryUid::Text(s.clone())),
                    other => other.as_i64().map(EntryUid::Number),
                })
                .unwrap_or_else(|| EntryUid::Text(format!("malformed-{}", slot)));
            warn!(uid = %uid, error = %e, "malformed world-book entry, loading it unmatchable");
            WorldBookEntry {
                uid,
                comment: text_field(&value, "comment"),
                content: text_field(&value, "content"),
                constant: flag_field(&value, "constant", false),
                disable: flag_field(&value, "disable", false),
                group: text_field(&value, "group"),
                malformed: Some(e.to_string()),
                ..WorldBookEntry::default()
            }
        }
    }
}

fn parse_role_memory(slot: &str, value: Value) -> RoleMemoryRecord {
    match RoleMemoryRecord::deserialize(&value) {
        Ok(record) => record,
        Err(e) => {
            let id = match value.get("id") {
                Some(Value::String(s)) => s.clone(),
                _ => format!("malformed-{}", slot),
            };
            warn!(id = %id, error = %e, "malformed role-memory record, loading it unmatchable");
            RoleMemoryRecord {
                id,
                memory_type: MemoryType::default(),
                keywords: Vec::new(),
                synonyms: Vec::new(),
                content: text_field(&value, "content"),
                priority: 0,
                is_constant: flag_field(&value, "is_constant", false),
                enabled: flag_field(&value, "enabled", true),
                timestamp: None,
                emotional_context: None,
                emotional_weight: None,
                time_decay_factor: None,
                related_topics: Vec::new(),
                weight: None,
                malformed: Some(e.to_string()),
            }
        }
    }
}

fn text_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn flag_field(value: &Value, key: &str, default: bool) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(default)
}
