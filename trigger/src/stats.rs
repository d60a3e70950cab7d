//! Stats tracker: running counters updated after every pipeline run.

use chrono::{DateTime, Utc};
use trigger_core::{InjectionResult, PopularEntry, TriggerStats};

/// Folds one result into `stats`.
///
/// - `total_triggers` grows by the injected count
/// - `today_triggers` restarts when the UTC day of the last update differs from `now`
/// - `avg_response_time_ms` is an incremental mean weighted by injected count
/// - `popular_entries` counts per entry id, sorted descending and cut to the top 10
pub fn update<P>(stats: &mut TriggerStats, result: &InjectionResult<P>, now: DateTime<Utc>) {
    let injected = result.injected_count as u64;
    stats.total_triggers += injected;

    let same_day = stats
        .last_updated
        .map(|last| last.date_naive() == now.date_naive())
        .unwrap_or(false);
    if same_day {
        stats.today_triggers += injected;
    } else {
        stats.today_triggers = injected;
    }

    if stats.total_triggers > 0 {
        let duration_ms = result.duration.as_secs_f64() * 1000.0;
        let previous = (stats.total_triggers - injected) as f64;
        stats.avg_response_time_ms =
            (stats.avg_response_time_ms * previous + duration_ms) / stats.total_triggers as f64;
    }

    for action in &result.actions {
        match stats
            .popular_entries
            .iter_mut()
            .find(|p| p.entry_id == action.entry_id)
        {
            Some(popular) => popular.count += 1,
            None => stats.popular_entries.push(PopularEntry {
                entry_id: action.entry_id.clone(),
                count: 1,
            }),
        }
    }
    stats.popular_entries.sort_by(|a, b| b.count.cmp(&a.count));
    stats.popular_entries.truncate(TriggerStats::POPULAR_LIMIT);

    stats.last_updated = Some(now);
}
