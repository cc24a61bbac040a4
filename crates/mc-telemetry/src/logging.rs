use tracing_subscriber::{fmt, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Human
        }
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise `default_level`
/// (e.g. "info", "mc_core=debug,warn"). An unparsable default falls back to
/// "info".
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global subscriber writing to stderr.
///
/// Safe to call multiple times (e.g. in tests). Only the first call installs
/// a subscriber; later calls return `false`.
pub fn init_logging(service_name: &str, default_level: &str, format: LogFormat) -> bool {
    let filter = env_filter(default_level);

    let installed = match format {
        LogFormat::Human => fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .try_init()
            .is_ok(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_level(true)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(service = service_name, log_format = ?format, "logging initialised");
    }
    installed
}
