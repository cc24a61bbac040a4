use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides `paths.tasks_dir`.
pub const TASKS_DIR_ENV: &str = "OPENCLAW_TASKS_DIR";

/// Top-level configuration loaded from `~/.config/mission-control/config.toml`.
///
/// Every section is optional; a missing file yields [`Config::default`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub settings: SettingsCacheConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults when
    /// the file does not exist. Environment overrides are applied last.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        let mut cfg = if path.exists() {
            Self::read(&path)?
        } else {
            Config::default()
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a specific path. Environment overrides are applied last.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut cfg = Self::read(&path.into())?;
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    fn read(path: &PathBuf) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.validate()?;
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `OPENCLAW_TASKS_DIR` when set and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(TASKS_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.paths.tasks_dir = PathBuf::from(dir);
            }
        }
    }

    /// Semantic validation for values serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;
        if self.paths.feed_events_file.trim().is_empty()
            || self.paths.agent_status_file.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "paths: sidecar file names must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Full path of the supplementary feed events file.
    pub fn feed_events_path(&self) -> PathBuf {
        self.paths.tasks_dir.join(&self.paths.feed_events_file)
    }

    /// Full path of the agent status overlay file.
    pub fn agent_status_path(&self) -> PathBuf {
        self.paths.tasks_dir.join(&self.paths.agent_status_file)
    }

    fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("mission-control")
            .join("config.toml")
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding one JSON file per task.
    #[serde(default = "default_tasks_dir")]
    pub tasks_dir: PathBuf,
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,
    /// Supplementary feed events, resolved inside `tasks_dir`.
    #[serde(default = "default_feed_events_file")]
    pub feed_events_file: String,
    /// Agent status overlay, resolved inside `tasks_dir`.
    #[serde(default = "default_agent_status_file")]
    pub agent_status_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tasks_dir: default_tasks_dir(),
            settings_file: default_settings_file(),
            feed_events_file: default_feed_events_file(),
            agent_status_file: default_agent_status_file(),
        }
    }
}

fn default_tasks_dir() -> PathBuf {
    PathBuf::from("./tasks")
}
fn default_settings_file() -> PathBuf {
    PathBuf::from("settings.json")
}
fn default_feed_events_file() -> String {
    "feed-items.json".into()
}
fn default_agent_status_file() -> String {
    "agents-status.json".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_task_file_bytes")]
    pub max_task_file_bytes: u64,
    /// How many of the newest tasks the feed looks at.
    #[serde(default = "default_feed_task_window")]
    pub feed_task_window: usize,
    /// How many supplementary events are merged into the feed.
    #[serde(default = "default_feed_event_limit")]
    pub feed_event_limit: usize,
    #[serde(default = "default_feed_max_items")]
    pub feed_max_items: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_task_file_bytes: default_max_task_file_bytes(),
            feed_task_window: default_feed_task_window(),
            feed_event_limit: default_feed_event_limit(),
            feed_max_items: default_feed_max_items(),
        }
    }
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("max_task_file_bytes", self.max_task_file_bytes as usize),
            ("feed_task_window", self.feed_task_window),
            ("feed_max_items", self.feed_max_items),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(ConfigError::Validation(format!(
                    "limits.{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

fn default_max_task_file_bytes() -> u64 {
    1_048_576
}
fn default_feed_task_window() -> usize {
    20
}
fn default_feed_event_limit() -> usize {
    10
}
fn default_feed_max_items() -> usize {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsCacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for SettingsCacheConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    5
}
