//! One aggregation pass: load tasks, derive every view, assemble the
//! snapshot handed to the transport layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::feed::{load_feed_events, synthesize_feed, FeedLimits};
use crate::roster::{resolve_roster, working_count};
use crate::settings::{ClientSettings, DashboardConfig, SettingsCache};
use crate::stats::{status_counts, token_stats};
use crate::task_store::{SkippedFile, TaskStore};
use crate::types::{Agent, FeedItem, StatusCounts, TaskRecord, TokenStats};

/// Everything the client renders, computed fresh per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub agents: Vec<Agent>,
    pub tasks: Vec<TaskRecord>,
    pub feed: Vec<FeedItem>,
    pub stats: StatusCounts,
    /// `null` when no task carries usage.
    pub token_stats: Option<TokenStats>,
    pub config: DashboardConfig,
    pub settings: ClientSettings,
    /// Epoch milliseconds at which the aggregation ran.
    pub timestamp: i64,
}

/// A snapshot plus the files that were left out of it.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub snapshot: DashboardSnapshot,
    pub skipped: Vec<SkippedFile>,
    pub directory_found: bool,
}

/// Runs aggregation passes against one configured task directory.
pub struct Dashboard {
    config: Config,
    settings: Arc<SettingsCache>,
}

impl Dashboard {
    pub fn new(config: Config, settings: Arc<SettingsCache>) -> Self {
        Self { config, settings }
    }

    /// Build a dashboard whose settings cache follows the config.
    pub fn from_config(config: Config) -> Self {
        let cache = SettingsCache::with_ttl(
            config.paths.settings_file.clone(),
            std::time::Duration::from_secs(config.settings.cache_ttl_secs),
        );
        Self::new(config, Arc::new(cache))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn task_store(&self) -> TaskStore {
        let paths = &self.config.paths;
        TaskStore::new(&paths.tasks_dir)
            .with_max_file_bytes(self.config.limits.max_task_file_bytes)
            .excluding([paths.feed_events_file.clone(), paths.agent_status_file.clone()])
    }

    pub fn aggregate(&self) -> Aggregation {
        self.aggregate_at(Utc::now())
    }

    /// Run one pass with `now` as the current instant.
    pub fn aggregate_at(&self, now: DateTime<Utc>) -> Aggregation {
        let now_ms = now.timestamp_millis();

        let report = self.task_store().load(now_ms);
        let agents = resolve_roster(&self.config.agent_status_path());
        let events = load_feed_events(&self.config.feed_events_path());

        let stats = status_counts(&report.tasks);
        let token_stats = token_stats(&report.tasks);
        let feed = synthesize_feed(
            &report.tasks,
            &events,
            working_count(&agents),
            now_ms,
            FeedLimits::from(&self.config.limits),
        );

        let settings = self.settings.get();

        info!(
            tasks = report.tasks.len(),
            skipped = report.skipped.len(),
            feed_items = feed.len(),
            working_agents = working_count(&agents),
            has_token_stats = token_stats.is_some(),
            "dashboard aggregated"
        );

        Aggregation {
            snapshot: DashboardSnapshot {
                agents,
                tasks: report.tasks,
                feed,
                stats,
                token_stats,
                config: settings.dashboard_config(),
                settings: settings.client_settings(),
                timestamp: now_ms,
            },
            skipped: report.skipped,
            directory_found: report.directory_found,
        }
    }
}
