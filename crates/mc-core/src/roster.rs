//! Agent roster: a fixed set of six agents whose working/idle status is
//! overlaid from a JSON map written by the agents themselves.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{Agent, AgentBadge, AgentStatus};

/// Fallback for colors that are not `#rrggbb`.
pub const NEUTRAL_GRAY: &str = "#697177";

/// Return `color` when it is a 6-digit hex color, else [`NEUTRAL_GRAY`].
pub fn sanitize_color(color: &str) -> String {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        color.to_string()
    } else {
        NEUTRAL_GRAY.to_string()
    }
}

fn agent(
    id: &str,
    name: &str,
    letter: &str,
    color: &str,
    role: &str,
    badge: Option<AgentBadge>,
) -> Agent {
    Agent {
        id: id.into(),
        name: name.into(),
        letter: letter.into(),
        color: sanitize_color(color),
        role: role.into(),
        status: AgentStatus::Idle,
        badge,
    }
}

/// The default roster, every agent idle.
pub fn default_roster() -> Vec<Agent> {
    vec![
        agent("neo", "Neo", "N", "#46a758", "Squad Lead", Some(AgentBadge::Lead)),
        agent("spark", "Spark", "S", "#ffb224", "Code & Writing", Some(AgentBadge::Spc)),
        agent("pixel", "Pixel", "P", "#e879a4", "Design & UI", Some(AgentBadge::Spc)),
        agent("scout", "Scout", "R", "#3e63dd", "Research", Some(AgentBadge::Spc)),
        agent("critic", "Critic", "C", "#8e4ec6", "Review & QA", None),
        agent("sentinel", "Sentinel", "T", "#00a2c7", "Security", None),
    ]
}

/// Apply an id → status map. Only the literal `"working"` marks an agent as
/// working; ids missing from the map, or mapped to anything else, are idle.
pub fn apply_overlay(mut roster: Vec<Agent>, overlay: &HashMap<String, Value>) -> Vec<Agent> {
    for agent in &mut roster {
        agent.status = match overlay.get(&agent.id).and_then(Value::as_str) {
            Some("working") => AgentStatus::Working,
            _ => AgentStatus::Idle,
        };
    }
    roster
}

/// Resolve the roster against the overlay file at `path`.
///
/// A missing or malformed overlay leaves the defaults untouched.
pub fn resolve_roster(path: &Path) -> Vec<Agent> {
    let roster = default_roster();
    if !path.exists() {
        debug!(path = %path.display(), "no agent status overlay");
        return roster;
    }
    let overlay = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| {
            serde_json::from_str::<HashMap<String, Value>>(&text).map_err(|e| e.to_string())
        });
    match overlay {
        Ok(overlay) => apply_overlay(roster, &overlay),
        Err(error) => {
            warn!(path = %path.display(), error = %error, "ignoring malformed agent status overlay");
            roster
        }
    }
}

/// Number of agents currently working.
pub fn working_count(agents: &[Agent]) -> usize {
    agents
        .iter()
        .filter(|a| a.status == AgentStatus::Working)
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
