//! Activity feed synthesis.
//!
//! The feed is rebuilt on every aggregation from three sources: recent task
//! transitions, an optional file of supplementary events written by bridge
//! scripts, and one synthetic "squad status" item.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::LimitsConfig;
use crate::normalize::{coerce_string, parse_date};
use crate::types::{FeedItem, FeedItemType, FeedSeverity, TaskRecord, TaskStatus};

/// Bounds applied while assembling the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLimits {
    /// Only this many of the newest tasks contribute items.
    pub task_window: usize,
    /// Only this many supplementary events (in file order) are considered.
    pub event_limit: usize,
    pub max_items: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            task_window: 20,
            event_limit: 10,
            max_items: 15,
        }
    }
}

impl From<&LimitsConfig> for FeedLimits {
    fn from(cfg: &LimitsConfig) -> Self {
        Self {
            task_window: cfg.feed_task_window,
            event_limit: cfg.feed_event_limit,
            max_items: cfg.feed_max_items,
        }
    }
}

/// One element of the supplementary events file, coerced leniently.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEvent {
    pub id: String,
    pub kind: Option<String>,
    pub title: String,
    pub agent_id: Option<String>,
    /// Date string or epoch millis.
    pub timestamp: Value,
}

impl FeedEvent {
    /// Coerce one array element. Non-object elements still occupy a slot in
    /// the event window but carry no timestamp, so the feed drops them.
    pub fn from_value(v: &Value) -> Self {
        let field = |key: &str| v.get(key).filter(|f| !f.is_null());
        Self {
            id: field("id").map(coerce_string).unwrap_or_default(),
            kind: field("type").and_then(Value::as_str).map(String::from),
            title: field("title").map(coerce_string).unwrap_or_default(),
            agent_id: field("agentId").map(coerce_string),
            timestamp: field("timestamp").cloned().unwrap_or(Value::Null),
        }
    }
}

/// Read the supplementary events file.
///
/// Returns an empty list when the file is absent, is not JSON, or is not a
/// JSON array. Individual elements are coerced field by field and never
/// invalidate their neighbours.
pub fn load_feed_events(path: &Path) -> Vec<FeedEvent> {
    if !path.exists() {
        debug!(path = %path.display(), "no supplementary feed events");
        return Vec::new();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<Vec<Value>>(&text).map_err(|e| e.to_string()));
    match parsed {
        Ok(raw) => raw.iter().map(FeedEvent::from_value).collect(),
        Err(error) => {
            warn!(path = %path.display(), error = %error, "ignoring malformed feed events file");
            Vec::new()
        }
    }
}

/// Build the feed, newest first and at most `limits.max_items` long.
///
/// `tasks` must already be sorted newest-first by creation time.
pub fn synthesize_feed(
    tasks: &[TaskRecord],
    events: &[FeedEvent],
    working_agents: usize,
    now_ms: i64,
    limits: FeedLimits,
) -> Vec<FeedItem> {
    let mut feed = vec![status_item(working_agents, now_ms)];

    feed.extend(tasks.iter().take(limits.task_window).filter_map(task_item));
    feed.extend(events.iter().take(limits.event_limit).filter_map(event_item));

    // Stable: the status item wins ties with real events.
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(limits.max_items);
    feed
}

fn status_item(working_agents: usize, now_ms: i64) -> FeedItem {
    let noun = if working_agents == 1 {
        "project"
    } else {
        "projects"
    };
    FeedItem {
        id: "status-now".into(),
        kind: FeedItemType::Status,
        severity: FeedSeverity::Success,
        title: format!("Squad active — {working_agents} {noun} online"),
        agent_id: None,
        timestamp: now_ms,
    }
}

fn task_item(task: &TaskRecord) -> Option<FeedItem> {
    let actor = task
        .assignee_id
        .as_deref()
        .map(capitalize)
        .unwrap_or_else(|| "Someone".to_string());

    let (suffix, severity, title, timestamp) = match task.status {
        TaskStatus::Done => (
            "complete",
            FeedSeverity::Success,
            format!("{actor} completed \"{}\"", task.title),
            task.updated_at?,
        ),
        TaskStatus::InProgress => (
            "progress",
            FeedSeverity::Info,
            format!("{actor} started \"{}\"", task.title),
            task.created_at,
        ),
        TaskStatus::Review => (
            "review",
            FeedSeverity::Info,
            format!("\"{}\" submitted for review", task.title),
            task.updated_at.unwrap_or(task.created_at),
        ),
        _ => return None,
    };

    Some(FeedItem {
        id: format!("{}-{suffix}", task.id),
        kind: FeedItemType::Task,
        severity,
        title,
        agent_id: task.assignee_id.clone(),
        timestamp,
    })
}

fn event_item(event: &FeedEvent) -> Option<FeedItem> {
    let Some(timestamp) = parse_date(&event.timestamp) else {
        debug!(id = %event.id, "dropping feed event without a usable timestamp");
        return None;
    };
    let kind = match event.kind.as_deref() {
        Some("memory") => FeedItemType::Decision,
        _ => FeedItemType::Comment,
    };
    Some(FeedItem {
        id: event.id.clone(),
        kind,
        severity: FeedSeverity::Info,
        title: event.title.clone(),
        agent_id: event.agent_id.clone(),
        timestamp,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;
    use serde_json::json;

    const NOW: i64 = 1_710_000_000_000;
    const HOUR: i64 = 3_600_000;

    fn task(id: &str, status: TaskStatus, created_at: i64) -> TaskRecord {
        TaskRecord {
            id: id.into(),
            title: format!("Task {id}"),
            description: String::new(),
            status,
            priority: Priority::Normal,
            assignee_id: None,
            tags: vec![],
            created_at,
            updated_at: None,
            usage: None,
        }
    }

    fn event(id: &str, kind: &str, ts: Value) -> FeedEvent {
        FeedEvent {
            id: id.into(),
            kind: Some(kind.into()),
            title: format!("event {id}"),
            agent_id: Some("scout".into()),
            timestamp: ts,
        }
    }

    fn assert_sorted(feed: &[FeedItem]) {
        assert!(feed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn status_item_wording() {
        let feed = synthesize_feed(&[], &[], 1, NOW, FeedLimits::default());
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, "status-now");
        assert_eq!(feed[0].kind, FeedItemType::Status);
        assert_eq!(feed[0].severity, FeedSeverity::Success);
        assert!(feed[0].title.ends_with("1 project online"));

        let feed = synthesize_feed(&[], &[], 0, NOW, FeedLimits::default());
        assert!(feed[0].title.ends_with("0 projects online"));
        let feed = synthesize_feed(&[], &[], 3, NOW, FeedLimits::default());
        assert!(feed[0].title.ends_with("3 projects online"));
    }

    #[test]
    fn task_items_by_status() {
        let mut done = task("d", TaskStatus::Done, NOW - 5 * HOUR);
        done.assignee_id = Some("spark".into());
        done.updated_at = Some(NOW - HOUR);
        let started = task("p", TaskStatus::InProgress, NOW - 2 * HOUR);
        let mut review = task("r", TaskStatus::Review, NOW - 3 * HOUR);
        review.updated_at = None;
        let inbox = task("i", TaskStatus::Inbox, NOW - 4 * HOUR);

        let feed = synthesize_feed(&[done, started, review, inbox], &[], 0, NOW, FeedLimits::default());
        let ids: Vec<&str> = feed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["status-now", "d-complete", "p-progress", "r-review"]);

        assert_eq!(feed[1].title, "Spark completed \"Task d\"");
        assert_eq!(feed[1].severity, FeedSeverity::Success);
        assert_eq!(feed[1].agent_id.as_deref(), Some("spark"));
        assert_eq!(feed[2].title, "Someone started \"Task p\"");
        assert_eq!(feed[3].title, "\"Task r\" submitted for review");
        assert_eq!(feed[3].timestamp, NOW - 3 * HOUR);
    }

    #[test]
    fn done_without_updated_at_is_silent() {
        let done = task("d", TaskStatus::Done, NOW - HOUR);
        let feed = synthesize_feed(&[done], &[], 0, NOW, FeedLimits::default());
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn only_task_window_contributes() {
        let tasks: Vec<TaskRecord> = (0..25)
            .map(|i| task(&format!("t{i}"), TaskStatus::InProgress, NOW - i * HOUR))
            .collect();
        let limits = FeedLimits {
            max_items: 100,
            ..FeedLimits::default()
        };
        let feed = synthesize_feed(&tasks, &[], 0, NOW, limits);
        assert_eq!(feed.len(), 21);
        assert!(feed.iter().all(|f| f.id != "t20-progress"));
    }

    #[test]
    fn events_are_mapped_and_limited() {
        let events: Vec<FeedEvent> = (0..12)
            .map(|i| {
                let kind = if i == 0 { "memory" } else { "file_claim" };
                event(&format!("e{i}"), kind, json!(NOW - (i + 1) * HOUR))
            })
            .collect();
        let limits = FeedLimits {
            max_items: 100,
            ..FeedLimits::default()
        };
        let feed = synthesize_feed(&[], &events, 0, NOW, limits);
        assert_eq!(feed.len(), 11);
        assert_eq!(feed[1].id, "e0");
        assert_eq!(feed[1].kind, FeedItemType::Decision);
        assert_eq!(feed[2].kind, FeedItemType::Comment);
        assert!(feed.iter().skip(1).all(|f| f.severity == FeedSeverity::Info));
        assert!(feed.iter().all(|f| f.id != "e10"));
    }

    #[test]
    fn event_timestamps_accept_strings_and_drop_garbage() {
        let events = vec![
            event("iso", "memory", json!("2024-03-09T12:00:00Z")),
            event("bad", "memory", json!("not a date")),
            event("none", "memory", Value::Null),
        ];
        let feed = synthesize_feed(&[], &events, 0, NOW, FeedLimits::default());
        let ids: Vec<&str> = feed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["status-now", "iso"]);
    }

    #[test]
    fn future_event_sorts_above_status_and_feed_is_capped() {
        let mut tasks: Vec<TaskRecord> = (0..20)
            .map(|i| task(&format!("t{i}"), TaskStatus::InProgress, NOW - (i + 1) * HOUR))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let events = vec![event("future", "memory", json!(NOW + HOUR))];

        let feed = synthesize_feed(&tasks, &events, 2, NOW, FeedLimits::default());
        assert_eq!(feed.len(), 15);
        assert_eq!(feed[0].id, "future");
        assert_eq!(feed[1].id, "status-now");
        assert_sorted(&feed);
    }

    #[test]
    fn events_file_that_is_not_an_array_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed-items.json");
        assert!(load_feed_events(&path).is_empty());

        std::fs::write(&path, r#"{"id":"ok","title":"fine"}"#).unwrap();
        assert!(load_feed_events(&path).is_empty());

        std::fs::write(&path, "[{").unwrap();
        assert!(load_feed_events(&path).is_empty());
    }

    #[test]
    fn odd_events_do_not_poison_their_neighbours() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed-items.json");
        let mut raw: Vec<Value> = (0..10)
            .map(|i| {
                json!({"id": format!("m{i}"), "type": "memory", "title": "noted",
                       "agentId": "neo", "timestamp": NOW - (i + 1) * HOUR})
            })
            .collect();
        raw.push(json!({"id": 11, "type": "file_claim", "timestamp": 1}));
        std::fs::write(&path, serde_json::to_string(&raw).unwrap()).unwrap();

        let events = load_feed_events(&path);
        assert_eq!(events.len(), 11);
        assert_eq!(events[0].agent_id.as_deref(), Some("neo"));
        assert_eq!(events[10].id, "11");
        assert_eq!(events[10].title, "");

        let feed = synthesize_feed(&[], &events, 0, NOW, FeedLimits::default());
        assert_eq!(feed.len(), 11);
        assert!(feed.iter().all(|f| f.id != "11"));
        assert!(feed.iter().skip(1).all(|f| f.kind == FeedItemType::Decision));
    }

    #[test]
    fn non_object_elements_hold_a_window_slot() {
        let raw = [json!(42), json!({"id": 7, "title": ["a", "b"], "type": 3, "timestamp": NOW - HOUR})];
        let events: Vec<FeedEvent> = raw.iter().map(FeedEvent::from_value).collect();
        assert_eq!(events[0].timestamp, Value::Null);
        assert_eq!(events[1].id, "7");
        assert_eq!(events[1].title, "a,b");
        assert_eq!(events[1].kind, None);

        let limits = FeedLimits {
            event_limit: 1,
            ..FeedLimits::default()
        };
        let feed = synthesize_feed(&[], &events, 0, NOW, limits);
        assert_eq!(feed.len(), 1);

        let feed = synthesize_feed(&[], &events, 0, NOW, FeedLimits::default());
        assert_eq!(feed[1].id, "7");
        assert_eq!(feed[1].kind, FeedItemType::Comment);
    }

    #[test]
    fn capitalize_handles_empty_and_unicode() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("spark"), "Spark");
        assert_eq!(capitalize("élan"), "Élan");
    }
}
