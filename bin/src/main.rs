//! quantstream CLI - Real-time tick analytics.

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use quantstream_lib::{StoreBackend, Timeframe};
use std::path::PathBuf;

mod commands;
mod display;
mod logging;

#[derive(Parser)]
#[command(name = "quantstream")]
#[command(about = "Real-time tick analytics: candles, rolling statistics and alerts", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,
}

/// Log output format.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Settings that override the configuration file.
#[derive(Args, Clone, Default)]
pub(crate) struct ConfigOverrides {
    /// JSON configuration file
    #[arg(short, long)]
    pub(crate) config: Option<PathBuf>,

    /// Symbols that get the default alert rules (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub(crate) symbols: Option<Vec<String>>,

    /// Candle timeframes (comma-separated, e.g. 1s,1m,5m)
    #[arg(short, long, value_delimiter = ',')]
    pub(crate) timeframes: Option<Vec<Timeframe>>,

    /// Rolling analytics window length
    #[arg(short, long)]
    pub(crate) window_size: Option<usize>,

    /// Alert cooldown in seconds
    #[arg(long)]
    pub(crate) cooldown: Option<u64>,

    /// Storage backend (memory, ndjson)
    #[arg(long)]
    pub(crate) store: Option<StoreBackend>,

    /// Output directory for the ndjson backend
    #[arg(short, long)]
    pub(crate) output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream NDJSON ticks through the pipeline until end of input or Ctrl-C
    Run {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Read ticks from a file instead of standard input
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        overrides: ConfigOverrides,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.quiet, cli.log_format == LogFormat::Json)?;

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Run {
            overrides,
            input,
            json,
        } => {
            let config = commands::load_config(&overrides)?;
            commands::run::run(config, input, json).await
        }
        Commands::Config { overrides } => {
            let config = commands::load_config(&overrides)?;
            commands::config::show_config(&config)
        }
    }
}
