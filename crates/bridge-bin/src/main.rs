//! fb-bridge - drives the Facebook login bridge against a firewall from the command line.

mod app;
mod navigator;
mod sdk;

use std::path::PathBuf;

use bridge_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};

/// fb-bridge command-line interface.
#[derive(Parser)]
#[command(name = "fb-bridge")]
#[command(about = "Reconcile Facebook SDK status events with a session-based firewall")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and logs. Defaults to ~/.fb-bridge
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Also append JSONL logs to <base-dir>/logs/bridge.jsonl
    #[arg(long, global = true)]
    log_to_file: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with the given app id and firewall routes
    Init(app::InitArgs),
    /// Validate the configuration and report readiness
    Check,
    /// Run one status event through the bridge
    Reconcile(app::ReconcileArgs),
    /// Print the "is authenticated" page fragment
    Expose {
        /// Whether the session is authenticated
        #[arg(long, action = clap::ArgAction::Set)]
        authenticated: bool,

        /// Output format (js, json)
        #[arg(long, default_value = "js")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    // Initialize logging
    init_logging(
        cli.log_level.as_deref().unwrap_or(&config.log_level),
        cli.log_to_file.then(|| paths.log_file()),
    );

    match cli.command {
        Commands::Init(args) => app::init(config, &paths, args)?,
        Commands::Check => app::check(&config)?,
        Commands::Reconcile(args) => app::reconcile(&config, args).await?,
        Commands::Expose {
            authenticated,
            format,
        } => app::expose(authenticated, &format)?,
    }

    Ok(())
}
