use std::io::Write;

use anyhow::Context;
use mc_core::config::Config;
use mc_core::dashboard::{Aggregation, Dashboard, DashboardSnapshot};
use mc_telemetry::spans::operation_span;
use serde_json::Value;
use tracing::{info, warn};

/// Which part of the snapshot to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Snapshot,
    Tasks,
    Stats,
    Tokens,
    Feed,
    Agents,
}

impl View {
    fn name(self) -> &'static str {
        match self {
            View::Snapshot => "snapshot",
            View::Tasks => "tasks",
            View::Stats => "stats",
            View::Tokens => "tokens",
            View::Feed => "feed",
            View::Agents => "agents",
        }
    }
}

/// Project the snapshot onto one view. `Tokens` is `null` when no task
/// carries usage.
pub fn select(view: View, snapshot: &DashboardSnapshot) -> serde_json::Result<Value> {
    match view {
        View::Snapshot => serde_json::to_value(snapshot),
        View::Tasks => serde_json::to_value(&snapshot.tasks),
        View::Stats => serde_json::to_value(&snapshot.stats),
        View::Tokens => serde_json::to_value(&snapshot.token_stats),
        View::Feed => serde_json::to_value(&snapshot.feed),
        View::Agents => serde_json::to_value(&snapshot.agents),
    }
}

pub fn render(view: View, aggregation: &Aggregation, pretty: bool) -> anyhow::Result<String> {
    let value = select(view, &aggregation.snapshot).context("failed to serialize snapshot")?;
    let text = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .context("failed to render JSON")?;
    Ok(text)
}

/// Run one aggregation pass and write the selected view to `out`.
pub fn run(config: Config, view: View, pretty: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let (span, trace_id) = operation_span("aggregate");
    let _guard = span.enter();

    let aggregation = Dashboard::from_config(config).aggregate();

    if !aggregation.skipped.is_empty() {
        let files: Vec<&str> = aggregation.skipped.iter().map(|s| s.file.as_str()).collect();
        warn!(count = files.len(), files = ?files, "some task files were skipped");
    }

    let text = render(view, &aggregation, pretty)?;
    writeln!(out, "{text}").context("failed to write output")?;
    info!(
        view = view.name(),
        trace_id = %trace_id,
        directory_found = aggregation.directory_found,
        "output written"
    );
    Ok(())
}
