//! Cosmetic dashboard settings (`settings.json`) and their TTL cache.
//!
//! The settings file is hand-edited, so every field is coerced on its own:
//! a wrong-typed value falls back to that field's default without affecting
//! the rest of the file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Schema version reported in [`DashboardConfig`].
pub const DASHBOARD_VERSION: &str = "0.2.0";

/// Minimum accepted client refresh interval, in milliseconds.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 5_000;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    #[default]
    Green,
    Blue,
    Purple,
    Orange,
    Red,
    Cyan,
    Amber,
    Pink,
}

impl AccentColor {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "green" => Some(AccentColor::Green),
            "blue" => Some(AccentColor::Blue),
            "purple" => Some(AccentColor::Purple),
            "orange" => Some(AccentColor::Orange),
            "red" => Some(AccentColor::Red),
            "cyan" => Some(AccentColor::Cyan),
            "amber" => Some(AccentColor::Amber),
            "pink" => Some(AccentColor::Pink),
            _ => None,
        }
    }

    /// Resolved colors for this accent.
    pub fn preset(&self) -> AccentPreset {
        let (primary, rgb) = match self {
            AccentColor::Green => ("#46a758", "70,167,88"),
            AccentColor::Blue => ("#3e63dd", "62,99,221"),
            AccentColor::Purple => ("#8e4ec6", "142,78,198"),
            AccentColor::Orange => ("#f76b15", "247,107,21"),
            AccentColor::Red => ("#e54d2e", "229,77,46"),
            AccentColor::Cyan => ("#00a2c7", "0,162,199"),
            AccentColor::Amber => ("#ffb224", "255,178,36"),
            AccentColor::Pink => ("#e879a4", "232,121,164"),
        };
        AccentPreset {
            primary: primary.to_string(),
            primary_light: format!("rgba({rgb},0.1)"),
            glow: format!("rgba({rgb},0.6)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccentPreset {
    pub primary: String,
    pub primary_light: String,
    pub glow: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardDensity {
    Compact,
    #[default]
    Comfortable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeDisplay {
    #[default]
    Utc,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundGradient {
    pub top_left: String,
    pub bottom_right: String,
}

impl Default for BackgroundGradient {
    fn default() -> Self {
        Self {
            top_left: "rgba(70,167,88,0.05)".into(),
            bottom_right: "rgba(62,99,221,0.05)".into(),
        }
    }
}

/// Parsed `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    pub name: String,
    pub subtitle: String,
    pub repo_url: Option<String>,
    /// Icon name understood by the client, e.g. "zap" or "brain".
    pub logo_icon: String,
    pub theme: Theme,
    pub accent_color: AccentColor,
    pub background_gradient: BackgroundGradient,
    pub card_density: CardDensity,
    pub show_metrics_panel: bool,
    pub show_token_panel: bool,
    /// Milliseconds.
    pub refresh_interval: u64,
    pub time_display: TimeDisplay,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            name: "OpenClaw".into(),
            subtitle: "Mission Control".into(),
            repo_url: None,
            logo_icon: "zap".into(),
            theme: Theme::Dark,
            accent_color: AccentColor::Green,
            background_gradient: BackgroundGradient::default(),
            card_density: CardDensity::Comfortable,
            show_metrics_panel: true,
            show_token_panel: true,
            refresh_interval: 30_000,
            time_display: TimeDisplay::Utc,
        }
    }
}

impl DashboardSettings {
    /// Coerce an arbitrary JSON object field by field.
    pub fn from_json(raw: &Map<String, Value>) -> Self {
        let d = Self::default();
        let string_or = |key: &str, fallback: String| {
            raw.get(key)
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or(fallback)
        };
        let gradient = raw.get("backgroundGradient").and_then(Value::as_object);
        let gradient_or = |key: &str, fallback: String| {
            gradient
                .and_then(|g| g.get(key))
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or(fallback)
        };

        Self {
            name: string_or("name", d.name),
            subtitle: string_or("subtitle", d.subtitle),
            repo_url: raw.get("repoUrl").and_then(Value::as_str).map(String::from),
            logo_icon: string_or("logoIcon", d.logo_icon),
            theme: match raw.get("theme").and_then(Value::as_str) {
                Some("light") => Theme::Light,
                _ => Theme::Dark,
            },
            accent_color: raw
                .get("accentColor")
                .and_then(Value::as_str)
                .and_then(AccentColor::from_name)
                .unwrap_or(d.accent_color),
            background_gradient: BackgroundGradient {
                top_left: gradient_or("topLeft", d.background_gradient.top_left),
                bottom_right: gradient_or("bottomRight", d.background_gradient.bottom_right),
            },
            card_density: match raw.get("cardDensity").and_then(Value::as_str) {
                Some("compact") => CardDensity::Compact,
                _ => CardDensity::Comfortable,
            },
            show_metrics_panel: raw.get("showMetricsPanel") != Some(&Value::Bool(false)),
            show_token_panel: raw.get("showTokenPanel") != Some(&Value::Bool(false)),
            refresh_interval: raw
                .get("refreshInterval")
                .and_then(Value::as_f64)
                .filter(|ms| *ms >= MIN_REFRESH_INTERVAL_MS as f64 && ms.is_finite())
                .map(|ms| ms as u64)
                .unwrap_or(d.refresh_interval),
            time_display: match raw.get("timeDisplay").and_then(Value::as_str) {
                Some("local") => TimeDisplay::Local,
                _ => TimeDisplay::Utc,
            },
        }
    }

    /// Settings as echoed to clients, with the accent preset resolved.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            accent: self.accent_color.preset(),
            settings: self.clone(),
        }
    }

    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            name: self.name.clone(),
            subtitle: self.subtitle.clone(),
            repo_url: self.repo_url.clone(),
            version: DASHBOARD_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(flatten)]
    pub settings: DashboardSettings,
    pub accent: AccentPreset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub name: String,
    pub subtitle: String,
    pub repo_url: Option<String>,
    pub version: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("settings root must be a JSON object")]
    NotAnObject,
}

/// Load and coerce the settings file.
pub fn load_settings(path: &Path) -> Result<DashboardSettings, SettingsError> {
    let text = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&text)?;
    let obj = raw.as_object().ok_or(SettingsError::NotAnObject)?;
    Ok(DashboardSettings::from_json(obj))
}

/// Load the settings file, falling back to defaults when it is missing or
/// unusable.
pub fn load_settings_or_default(path: &Path) -> DashboardSettings {
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return DashboardSettings::default();
    }
    load_settings(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
        DashboardSettings::default()
    })
}

// ---------------------------------------------------------------------------
// SettingsCache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CachedSettings {
    value: Arc<DashboardSettings>,
    fetched_at: Instant,
}

/// Settings reader that re-reads the file at most once per TTL.
///
/// Shared behind an `Arc` by every aggregation. Concurrent callers that
/// find the entry stale may each refresh it; the last write wins.
#[derive(Debug)]
pub struct SettingsCache {
    path: PathBuf,
    ttl: Duration,
    cached: RwLock<Option<CachedSettings>>,
}

impl SettingsCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_ttl(path, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current settings, refreshed from disk when the cached copy is stale.
    pub fn get(&self) -> Arc<DashboardSettings> {
        self.get_at(Instant::now())
    }

    /// Same as [`get`](Self::get) with an explicit clock reading.
    pub fn get_at(&self, now: Instant) -> Arc<DashboardSettings> {
        {
            let guard = self.cached.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = guard.as_ref() {
                if now.saturating_duration_since(entry.fetched_at) < self.ttl {
                    return Arc::clone(&entry.value);
                }
            }
        }

        let value = Arc::new(load_settings_or_default(&self.path));
        let mut guard = self.cached.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(CachedSettings {
            value: Arc::clone(&value),
            fetched_at: now,
        });
        value
    }

    /// Drop the cached copy so the next read goes to disk.
    pub fn invalidate(&self) {
        let mut guard = self.cached.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
