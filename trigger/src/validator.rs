//! # Validator
//!
//! Filters matches before ranking. Checks run in order and stop at the first failure:
//!
//! 1. **Cooldown**: the entry was injected less than `injection_cooldown` ago
//! 2. **Selective conditions**: every `required` condition must hold; the others are
//!    only logged. Custom / unknown condition types pass.
//! 3. **Context requirements**: every requirement must hold
//!
//! Rejections are not errors; they are returned as [`SkippedEntry`] records.

use chrono::{DateTime, Utc};
use tracing::debug;
use trigger_core::{
    ConditionOperator, ConditionType, ConversationContext, EngineState, EntryPayload, Match,
    MatchConfig, MessageRole, RequirementOperator, RequirementType, SelectiveCondition,
    ContextRequirement, SkipReason, SkippedEntry, TriggerEntry,
};

/// Matches that passed validation, and the ones that did not.
#[derive(Debug)]
pub struct ValidationOutcome<P> {
    pub accepted: Vec<Match<P>>,
    pub skipped: Vec<SkippedEntry>,
}

/// Validates matches against cooldowns, selective conditions and context requirements.
pub fn validate<P: EntryPayload>(
    matches: Vec<Match<P>>,
    ctx: &ConversationContext,
    state: &EngineState<P>,
    cfg: &MatchConfig,
    now: DateTime<Utc>,
) -> ValidationOutcome<P> {
    let mut accepted = Vec::with_capacity(matches.len());
    let mut skipped = Vec::new();

    for m in matches {
        let reason = check_cooldown(&m.entry.id, state, cfg, now)
            .or_else(|| check_conditions(&m.entry, ctx, cfg.case_sensitive))
            .or_else(|| check_requirements(&m.entry, ctx, state, cfg.case_sensitive, now));
        match reason {
            Some(reason) => {
                debug!(entry_id = %m.entry.id, reason = %reason, "match rejected");
                skipped.push(SkippedEntry {
                    entry_id: m.entry.id.clone(),
                    reason,
                });
            }
            None => accepted.push(m),
        }
    }

    ValidationOutcome { accepted, skipped }
}

/// Cooldown still running for `entry_id`, if any.
pub fn check_cooldown<P>(
    entry_id: &str,
    state: &EngineState<P>,
    cfg: &MatchConfig,
    now: DateTime<Utc>,
) -> Option<SkipReason> {
    let cooldown = cfg.injection_cooldown();
    state
        .injection_history
        .iter()
        .filter(|r| r.entry_id == entry_id)
        .map(|r| now - r.injected_at)
        .filter(|elapsed| *elapsed < cooldown)
        .min()
        .map(|elapsed| SkipReason::Cooldown {
            remaining_ms: (cooldown - elapsed).num_milliseconds().max(0) as u64,
        })
}

fn check_conditions<P>(
    entry: &TriggerEntry<P>,
    ctx: &ConversationContext,
    case_sensitive: bool,
) -> Option<SkipReason> {
    for condition in &entry.selective_conditions {
        let holds = evaluate_condition(condition, ctx, case_sensitive);
        if condition.required && !holds {
            return Some(SkipReason::SelectiveCondition {
                condition: format!("{:?} {:?} {}", condition.condition_type, condition.operator, condition.value),
            });
        }
        if !condition.required {
            debug!(
                entry_id = %entry.id,
                condition_type = ?condition.condition_type,
                value = %condition.value,
                holds,
                "informational condition"
            );
        }
    }
    None
}

/// Evaluates one selective condition. Custom conditions always hold.
pub fn evaluate_condition(
    condition: &SelectiveCondition,
    ctx: &ConversationContext,
    case_sensitive: bool,
) -> bool {
    let candidates: Vec<&str> = match condition.condition_type {
        ConditionType::Tag => ctx.context_keywords.iter().map(String::as_str).collect(),
        ConditionType::Character => speaker_names(ctx, MessageRole::Assistant),
        ConditionType::User => speaker_names(ctx, MessageRole::User),
        ConditionType::Scenario => ctx.current_topic.as_deref().into_iter().collect(),
        ConditionType::Custom => return true,
    };
    compare_any(&candidates, &condition.value, condition.operator, case_sensitive)
}

fn speaker_names(ctx: &ConversationContext, role: MessageRole) -> Vec<&str> {
    ctx.conversation_history
        .iter()
        .filter(|m| m.role == role)
        .filter_map(|m| m.name.as_deref())
        .collect()
}

/// Positive operators hold if any candidate satisfies them; negated ones if none
/// satisfies the positive form.
fn compare_any(
    candidates: &[&str],
    value: &str,
    operator: ConditionOperator,
    case_sensitive: bool,
) -> bool {
    let value = fold(value, case_sensitive);
    let equals = || candidates.iter().any(|c| fold(c, case_sensitive) == value);
    let contains = || candidates.iter().any(|c| fold(c, case_sensitive).contains(&value));
    match operator {
        ConditionOperator::Equals => equals(),
        ConditionOperator::NotEquals => !equals(),
        ConditionOperator::Contains => contains(),
        ConditionOperator::NotContains => !contains(),
    }
}

fn check_requirements<P>(
    entry: &TriggerEntry<P>,
    ctx: &ConversationContext,
    state: &EngineState<P>,
    case_sensitive: bool,
    now: DateTime<Utc>,
) -> Option<SkipReason> {
    entry
        .context_requirements
        .iter()
        .find(|req| !evaluate_requirement(req, &entry.id, ctx, state, case_sensitive, now))
        .map(|req| SkipReason::ContextRequirement {
            requirement: format!(
                "{:?} {:?} {}",
                req.requirement_type,
                req.effective_operator(),
                req.value
            ),
        })
}

/// Evaluates one context requirement for `entry_id`.
///
/// Unparsable numeric values never hold.
pub fn evaluate_requirement<P>(
    requirement: &ContextRequirement,
    entry_id: &str,
    ctx: &ConversationContext,
    state: &EngineState<P>,
    case_sensitive: bool,
    now: DateTime<Utc>,
) -> bool {
    let operator = requirement.effective_operator();
    match requirement.requirement_type {
        RequirementType::MinMessages | RequirementType::MaxMessages => {
            compare_number(ctx.conversation_history.len() as f64, &requirement.value, operator)
        }
        RequirementType::TimeSinceLast => match state.last_injected_at(entry_id) {
            Some(at) => compare_number(
                (now - at).num_milliseconds() as f64,
                &requirement.value,
                operator,
            ),
            None => true,
        },
        RequirementType::UserRole => compare_text(
            ctx.last_message().map(|m| m.role.as_str()),
            &requirement.value,
            operator,
            false,
        ),
        RequirementType::ConversationTopic => compare_text(
            ctx.current_topic.as_deref(),
            &requirement.value,
            operator,
            case_sensitive,
        ),
    }
}

fn compare_number(actual: f64, expected: &str, operator: RequirementOperator) -> bool {
    let Ok(expected) = expected.trim().parse::<f64>() else {
        return false;
    };
    match operator {
        RequirementOperator::Gte => actual >= expected,
        RequirementOperator::Lte => actual <= expected,
        RequirementOperator::Eq => actual == expected,
        RequirementOperator::Ne => actual != expected,
        RequirementOperator::Contains => false,
    }
}

fn compare_text(
    actual: Option<&str>,
    expected: &str,
    operator: RequirementOperator,
    case_sensitive: bool,
) -> bool {
    let Some(actual) = actual else {
        return operator == RequirementOperator::Ne;
    };
    let actual = fold(actual, case_sensitive);
    let expected = fold(expected, case_sensitive);
    match operator {
        RequirementOperator::Eq => actual == expected,
        RequirementOperator::Ne => actual != expected,
        RequirementOperator::Contains => actual.contains(&expected),
        RequirementOperator::Gte | RequirementOperator::Lte => false,
    }
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.trim().to_string()
    } else {
        text.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;
    use trigger_core::{CooldownRecord, HistoryMessage, MatchType, WorldBookPayload};

    fn matched(entry: TriggerEntry<WorldBookPayload>) -> Match<WorldBookPayload> {
        Match {
            entry: Arc::new(entry),
            matched_keyword: "k".to_string(),
            match_type: MatchType::Primary,
            score: 0.8,
            positions: vec![0],
            matched_messages: vec![],
        }
    }

    fn base(id: &str) -> TriggerEntry<WorldBookPayload> {
        TriggerEntry::new(id, "", WorldBookPayload::default()).with_primary_keys(["k"])
    }

    fn cooldown_config(ms: u64) -> MatchConfig {
        MatchConfig {
            injection_cooldown_ms: ms,
            ..MatchConfig::default()
        }
    }

    #[test]
    fn cooldown_rejects_recent_injection() {
        let now = Utc::now();
        let mut state = EngineState::<WorldBookPayload>::new();
        state.injection_history.push(CooldownRecord {
            entry_id: "e".to_string(),
            injected_at: now - Duration::milliseconds(500),
            expire_at: now + Duration::milliseconds(500),
        });
        let ctx = ConversationContext::new("k");
        let cfg = cooldown_config(1000);

        let out = validate(vec![matched(base("e"))], &ctx, &state, &cfg, now);
        assert!(out.accepted.is_empty());
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::Cooldown { remaining_ms: 500 }
        );

        let later = now + Duration::milliseconds(1000);
        let out = validate(vec![matched(base("e"))], &ctx, &state, &cfg, later);
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn required_condition_must_hold() {
        let state = EngineState::<WorldBookPayload>::new();
        let entry = base("e").with_condition(SelectiveCondition {
            condition_type: ConditionType::Tag,
            value: "Magic".to_string(),
            operator: ConditionOperator::Equals,
            required: true,
        });
        let cfg = MatchConfig::default();

        let ctx = ConversationContext::new("k").with_keywords(["combat"]);
        let out = validate(vec![matched(entry.clone())], &ctx, &state, &cfg, Utc::now());
        assert!(matches!(
            out.skipped[0].reason,
            SkipReason::SelectiveCondition { .. }
        ));

        let ctx = ConversationContext::new("k").with_keywords(["magic"]);
        let out = validate(vec![matched(entry)], &ctx, &state, &cfg, Utc::now());
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn optional_and_custom_conditions_pass() {
        let state = EngineState::<WorldBookPayload>::new();
        let entry = base("e")
            .with_condition(SelectiveCondition {
                condition_type: ConditionType::Scenario,
                value: "tavern".to_string(),
                operator: ConditionOperator::Equals,
                required: false,
            })
            .with_condition(SelectiveCondition {
                condition_type: ConditionType::Custom,
                value: "anything".to_string(),
                operator: ConditionOperator::Equals,
                required: true,
            });
        let ctx = ConversationContext::new("k");
        let out = validate(
            vec![matched(entry)],
            &ctx,
            &state,
            &MatchConfig::default(),
            Utc::now(),
        );
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn character_condition_uses_speaker_names() {
        let cond = SelectiveCondition {
            condition_type: ConditionType::Character,
            value: "Alice".to_string(),
            operator: ConditionOperator::Equals,
            required: true,
        };
        let ctx = ConversationContext::new("hi").with_history(vec![
            HistoryMessage::user("hello").named("Bob"),
            HistoryMessage::assistant("hi Bob").named("alice"),
        ]);
        assert!(evaluate_condition(&cond, &ctx, false));
        assert!(!evaluate_condition(&cond, &ctx, true));

        let not_user = SelectiveCondition {
            condition_type: ConditionType::User,
            value: "Bob".to_string(),
            operator: ConditionOperator::NotEquals,
            required: true,
        };
        assert!(!evaluate_condition(&not_user, &ctx, false));
    }

    #[test]
    fn min_messages_requirement() {
        let state = EngineState::<WorldBookPayload>::new();
        let entry = base("e").with_requirement(ContextRequirement {
            requirement_type: RequirementType::MinMessages,
            value: "2".to_string(),
            operator: None,
        });
        let short = ConversationContext::new("k").with_history(vec![HistoryMessage::user("a")]);
        let out = validate(
            vec![matched(entry.clone())],
            &short,
            &state,
            &MatchConfig::default(),
            Utc::now(),
        );
        assert!(matches!(
            out.skipped[0].reason,
            SkipReason::ContextRequirement { .. }
        ));

        let long = short
            .clone()
            .with_history(vec![HistoryMessage::user("a"), HistoryMessage::assistant("b")]);
        let out = validate(
            vec![matched(entry)],
            &long,
            &state,
            &MatchConfig::default(),
            Utc::now(),
        );
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn unparsable_requirement_value_fails() {
        let state = EngineState::<WorldBookPayload>::new();
        let req = ContextRequirement {
            requirement_type: RequirementType::MaxMessages,
            value: "many".to_string(),
            operator: None,
        };
        let ctx = ConversationContext::new("k");
        assert!(!evaluate_requirement(&req, "e", &ctx, &state, false, Utc::now()));
    }

    #[test]
    fn time_since_last_and_role_and_topic_requirements() {
        let now = Utc::now();
        let mut state = EngineState::<WorldBookPayload>::new();
        let since = ContextRequirement {
            requirement_type: RequirementType::TimeSinceLast,
            value: "1000".to_string(),
            operator: None,
        };
        let ctx = ConversationContext::new("k")
            .with_history(vec![HistoryMessage::assistant("a")])
            .with_topic("Tavern brawl");
        assert!(evaluate_requirement(&since, "e", &ctx, &state, false, now));

        state.mark_injected("e", now - Duration::milliseconds(200));
        assert!(!evaluate_requirement(&since, "e", &ctx, &state, false, now));
        assert!(evaluate_requirement(
            &since,
            "e",
            &ctx,
            &state,
            false,
            now + Duration::milliseconds(800)
        ));

        let role = ContextRequirement {
            requirement_type: RequirementType::UserRole,
            value: "assistant".to_string(),
            operator: None,
        };
        assert!(evaluate_requirement(&role, "e", &ctx, &state, false, now));

        let topic = ContextRequirement {
            requirement_type: RequirementType::ConversationTopic,
            value: "tavern".to_string(),
            operator: None,
        };
        assert!(evaluate_requirement(&topic, "e", &ctx, &state, false, now));
        assert!(!evaluate_requirement(&topic, "e", &ctx, &state, true, now));
    }
}
