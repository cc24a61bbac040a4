use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Inbox,
    Assigned,
    InProgress,
    Review,
    Waiting,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::Inbox,
        TaskStatus::Assigned,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Waiting,
        TaskStatus::Done,
    ];

    /// Map a raw status string onto the canonical set.
    ///
    /// Matching is case-insensitive. Anything unrecognized lands in `Inbox`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "complete" | "completed" | "done" | "approved" => TaskStatus::Done,
            "in-progress" | "in_progress" | "active" | "working" => TaskStatus::InProgress,
            "review" | "submitted" | "pending_review" => TaskStatus::Review,
            "assigned" | "claimed" => TaskStatus::Assigned,
            "waiting" | "blocked" | "paused" => TaskStatus::Waiting,
            _ => TaskStatus::Inbox,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Inbox => "inbox",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Waiting => "waiting",
            TaskStatus::Done => "done",
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Task priority, serialized as its ordinal (0 = most urgent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    Urgent = 0,
    High = 1,
    Normal = 2,
}

impl Priority {
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "urgent" | "p0" | "critical" => Priority::Urgent,
            "high" | "p1" => Priority::High,
            _ => Priority::Normal,
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Urgent),
            1 => Ok(Priority::High),
            2 => Ok(Priority::Normal),
            other => Err(format!("priority out of range: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// TokenUsageEntry
// ---------------------------------------------------------------------------

/// One recorded LLM call attributed to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsageEntry {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

// ---------------------------------------------------------------------------
// TaskRecord
// ---------------------------------------------------------------------------

/// Canonical task, produced by [`crate::normalize::normalize_task`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    pub tags: Vec<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Never `Some(vec![])`: an empty usage list is dropped during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Vec<TokenUsageEntry>>,
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedItemType {
    Task,
    Decision,
    Comment,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSeverity {
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FeedItemType,
    pub severity: FeedSeverity,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Working,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentBadge {
    Lead,
    Spc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub letter: String,
    pub color: String,
    pub role: String,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<AgentBadge>,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: u64,
    pub done: u64,
    pub in_progress: u64,
    pub review: u64,
    pub assigned: u64,
    pub inbox: u64,
    pub waiting: u64,
}

impl StatusCounts {
    pub fn get(&self, status: TaskStatus) -> u64 {
        match status {
            TaskStatus::Inbox => self.inbox,
            TaskStatus::Assigned => self.assigned,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Review => self.review,
            TaskStatus::Waiting => self.waiting,
            TaskStatus::Done => self.done,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTotals {
    pub input: u64,
    pub output: u64,
}

impl TokenTotals {
    /// Accumulate one entry. Counts saturate at `u64::MAX`.
    pub fn add(&mut self, entry: &TokenUsageEntry) {
        self.input = self.input.saturating_add(entry.input_tokens);
        self.output = self.output.saturating_add(entry.output_tokens);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTokens {
    pub model: String,
    pub input: u64,
    pub output: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTokens {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub input: u64,
    pub output: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub tokens_by_agent: BTreeMap<String, TokenTotals>,
    pub tokens_by_model: Vec<ModelTokens>,
    pub daily_tokens: Vec<DailyTokens>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        for status in TaskStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.as_str());
        }
    }

    #[test]
    fn status_mapping_is_case_insensitive() {
        assert_eq!(TaskStatus::from_raw("APPROVED"), TaskStatus::Done);
        assert_eq!(TaskStatus::from_raw("In_Progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::from_raw("Pending_Review"), TaskStatus::Review);
        assert_eq!(TaskStatus::from_raw("Claimed"), TaskStatus::Assigned);
        assert_eq!(TaskStatus::from_raw("blocked"), TaskStatus::Waiting);
        assert_eq!(TaskStatus::from_raw("cancelled"), TaskStatus::Inbox);
        assert_eq!(TaskStatus::from_raw(""), TaskStatus::Inbox);
    }

    #[test]
    fn priority_serializes_as_ordinal() {
        assert_eq!(serde_json::to_string(&Priority::Urgent).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Priority::Normal).unwrap(), "2");
        let back: Priority = serde_json::from_str("1").unwrap();
        assert_eq!(back, Priority::High);
        assert!(serde_json::from_str::<Priority>("7").is_err());
    }

    #[test]
    fn priority_mapping() {
        assert_eq!(Priority::from_raw("P0"), Priority::Urgent);
        assert_eq!(Priority::from_raw("Critical"), Priority::Urgent);
        assert_eq!(Priority::from_raw("p1"), Priority::High);
        assert_eq!(Priority::from_raw("low"), Priority::Normal);
    }

    #[test]
    fn feed_item_uses_type_key() {
        let item = FeedItem {
            id: "x".into(),
            kind: FeedItemType::Decision,
            severity: FeedSeverity::Info,
            title: "t".into(),
            agent_id: None,
            timestamp: 1,
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["type"], "decision");
        assert_eq!(v["severity"], "info");
        assert!(v.get("agentId").is_none());
    }

    #[test]
    fn task_record_omits_absent_fields() {
        let task = TaskRecord {
            id: "t1".into(),
            title: "Untitled".into(),
            description: String::new(),
            status: TaskStatus::Inbox,
            priority: Priority::Normal,
            assignee_id: None,
            tags: vec![],
            created_at: 0,
            updated_at: None,
            usage: None,
        };
        let v = serde_json::to_value(&task).unwrap();
        assert!(v.get("usage").is_none());
        assert!(v.get("assigneeId").is_none());
        assert_eq!(v["createdAt"], 0);
        assert_eq!(v["priority"], 2);
    }
}
