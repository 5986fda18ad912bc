//! GaChat CLI - Command-line host for the local message store.
//!
//! Runs the store lifecycle the way the chat page does (reset, open, seed,
//! ready, teardown on discard) and offers read-only inspection of a kept
//! database. Useful for headless operation, scripting, and debugging.

mod commands;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use ga_core::config::{AppConfig, ConfigHandle};
use ga_core::error::GaResult;
use ga_core::logging;
use ga_core::platform::Platform;

/// GaChat - local chat history store.
#[derive(Parser)]
#[command(
    name = "gachat",
    version,
    about = "GaChat local message store CLI",
    long_about = "A command-line host for the GaChat local message store.\n\
                   Runs the startup and teardown lifecycle and inspects stored messages."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the store lifecycle: start up, wait for Ctrl-C, then tear down.
    Run {
        /// Tear down right after startup instead of waiting for Ctrl-C.
        #[arg(long)]
        once: bool,
    },
    /// Count the messages in a partition.
    Count {
        /// Partition to read (defaults to the configured one).
        #[arg(short, long)]
        partition: Option<String>,
    },
    /// List the messages in a partition, in key order.
    List {
        /// Partition to read (defaults to the configured one).
        #[arg(short, long)]
        partition: Option<String>,
        /// Maximum number of messages to show.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show the message stored at a key.
    Get {
        /// Message key.
        key: i64,
        /// Partition to read (defaults to the configured one).
        #[arg(short, long)]
        partition: Option<String>,
    },
    /// List the partitions of the database.
    Partitions,
    /// Delete the database and all of its partitions.
    Delete {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the database file path.
    Path,
}

#[tokio::main]
async fn main() -> GaResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from_file(std::path::Path::new(path))?,
        None => AppConfig::load_default()?,
    };

    // Initialize logging
    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    let log_dir = config.effective_log_dir()?;
    let _guard = match logging::init_logging(&logging_config, &log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            // File logging is optional; fall back to stderr only.
            logging::init_console_logging(&logging_config.level);
            warn!("file logging unavailable in {}: {e}", log_dir.display());
            None
        }
    };

    let config_handle = ConfigHandle::new(config);

    info!(
        "GaChat CLI v{} on {}",
        ga_core::constants::APP_VERSION,
        Platform::current()
    );

    // Dispatch to command handlers
    match cli.command {
        Commands::Run { once } => commands::run::run(config_handle, once, cli.format).await,
        Commands::Count { partition } => {
            commands::messages::count(config_handle, partition, cli.format).await
        }
        Commands::List { partition, limit } => {
            commands::messages::list(config_handle, partition, limit, cli.format).await
        }
        Commands::Get { key, partition } => {
            commands::messages::get(config_handle, key, partition, cli.format).await
        }
        Commands::Partitions => commands::messages::partitions(config_handle, cli.format).await,
        Commands::Delete { yes } => commands::db::delete(config_handle, yes, cli.format).await,
        Commands::Path => commands::db::path(config_handle, cli.format).await,
    }
}
