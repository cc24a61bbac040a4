pub mod snapshot;

use std::path::PathBuf;

use anyhow::Context;
use mc_core::config::Config;

/// Command-line values that take precedence over the config file and the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub tasks_dir: Option<PathBuf>,
    pub settings_file: Option<PathBuf>,
}

/// Load the config (explicit file or default location), then apply the
/// command-line overrides.
pub fn resolve_config(overrides: &ConfigOverrides) -> anyhow::Result<Config> {
    let mut config = match &overrides.config_file {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };

    if let Some(dir) = &overrides.tasks_dir {
        config.paths.tasks_dir = dir.clone();
    }
    if let Some(file) = &overrides.settings_file {
        config.paths.settings_file = file.clone();
    }
    Ok(config)
}
