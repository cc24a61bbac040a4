mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mc_telemetry::logging::{init_logging, LogFormat};

use commands::snapshot::View;
use commands::ConfigOverrides;

/// mission-control CLI: aggregate an OpenClaw task directory into dashboard JSON.
#[derive(Parser, Debug)]
#[command(name = "mc", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/mission-control/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Task directory, overriding config and OPENCLAW_TASKS_DIR.
    #[arg(long, global = true)]
    tasks_dir: Option<PathBuf>,

    /// Dashboard settings file.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    /// Default log level when RUST_LOG is unset.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Pretty-print the JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Full dashboard snapshot (default when no subcommand is given).
    Snapshot,
    /// Normalized task records, newest first.
    Tasks,
    /// Task counts per status.
    Stats,
    /// Token usage totals, or null when no task reports usage.
    Tokens,
    /// Activity feed.
    Feed,
    /// Agent roster with live status.
    Agents,
}

impl From<Commands> for View {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::Snapshot => View::Snapshot,
            Commands::Tasks => View::Tasks,
            Commands::Stats => View::Stats,
            Commands::Tokens => View::Tokens,
            Commands::Feed => View::Feed,
            Commands::Agents => View::Agents,
        }
    }
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            tasks_dir: self.tasks_dir.clone(),
            settings_file: self.settings.clone(),
        }
    }

    fn view(&self) -> View {
        self.command.map(View::from).unwrap_or_default()
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::resolve_config(&cli.overrides())?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    let format = LogFormat::from_json_flag(cli.log_json || config.general.log_json);
    init_logging("mc", &level, format);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::snapshot::run(config, cli.view(), cli.pretty, &mut out)
}
