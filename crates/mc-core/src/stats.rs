//! Status counts and token-usage rollups over a loaded task collection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::types::{
    DailyTokens, ModelTokens, StatusCounts, TaskRecord, TaskStatus, TokenStats, TokenTotals,
};

const UNKNOWN_KEY: &str = "unknown";

/// Count tasks per canonical status in a single pass.
pub fn status_counts(tasks: &[TaskRecord]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for task in tasks {
        counts.total += 1;
        let slot = match task.status {
            TaskStatus::Inbox => &mut counts.inbox,
            TaskStatus::Assigned => &mut counts.assigned,
            TaskStatus::InProgress => &mut counts.in_progress,
            TaskStatus::Review => &mut counts.review,
            TaskStatus::Waiting => &mut counts.waiting,
            TaskStatus::Done => &mut counts.done,
        };
        *slot += 1;
    }
    counts
}

/// Roll token usage up by agent, model and UTC day.
///
/// Returns `None` when no task carries usage, so callers can tell "no data"
/// apart from "zero tokens".
pub fn token_stats(tasks: &[TaskRecord]) -> Option<TokenStats> {
    let mut with_usage = tasks
        .iter()
        .filter_map(|t| t.usage.as_deref().filter(|u| !u.is_empty()).map(|u| (t, u)))
        .peekable();
    with_usage.peek()?;

    let mut total = TokenTotals::default();
    let mut by_agent: BTreeMap<String, TokenTotals> = BTreeMap::new();
    let mut by_model: BTreeMap<String, TokenTotals> = BTreeMap::new();
    let mut by_day: BTreeMap<String, TokenTotals> = BTreeMap::new();

    for (task, usage) in with_usage {
        let agent = task.assignee_id.as_deref().unwrap_or(UNKNOWN_KEY);
        for entry in usage {
            total.add(entry);
            by_agent.entry(agent.to_string()).or_default().add(entry);

            let model = entry.model.as_deref().unwrap_or(UNKNOWN_KEY);
            by_model.entry(model.to_string()).or_default().add(entry);

            let at = entry.timestamp.filter(|ts| *ts != 0).unwrap_or(task.created_at);
            by_day.entry(day_key(at)).or_default().add(entry);
        }
    }

    Some(TokenStats {
        total_input_tokens: total.input,
        total_output_tokens: total.output,
        tokens_by_agent: by_agent,
        tokens_by_model: by_model
            .into_iter()
            .map(|(model, t)| ModelTokens {
                model,
                input: t.input,
                output: t.output,
            })
            .collect(),
        // BTreeMap iteration is already ascending; YYYY-MM-DD sorts lexically.
        daily_tokens: by_day
            .into_iter()
            .map(|(date, t)| DailyTokens {
                date,
                input: t.input,
                output: t.output,
            })
            .collect(),
    })
}

/// UTC calendar day of an epoch-millis instant, as `YYYY-MM-DD`.
pub fn day_key(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN_KEY.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
