//! Sprig CLI - Identify plants from photos, with a vision-model second opinion.
//!
//! Sprig sends photos to Pl@ntNet and, when Pl@ntNet is unsure, asks a
//! vision model to caption each photo. The combined result is printed as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Identify from a single photo
//! sprig identify leaf.jpg --organ leaf
//!
//! # Several photos of the same plant, with organ tags in order
//! sprig identify leaf.jpg flower.jpg --organ leaf --organ flower --no-reject
//!
//! # View configuration
//! sprig config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Sprig - Plant identification with a low-confidence vision-model fallback.
#[derive(Parser, Debug)]
#[command(name = "sprig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "SPRIG_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Identify the plant shown in one or more photos
    Identify(cli::identify::IdentifyArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config_path = cli.config.as_deref().map(sprig_core::Config::expand_path);
    let loaded = match &config_path {
        Some(path) => sprig_core::Config::load_from(path),
        None => sprig_core::Config::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) if config_path.is_some() => {
            // An explicitly requested config must load
            return Err(e.into());
        }
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `sprig config path`."
            );
            sprig_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Sprig v{}", sprig_core::VERSION);

    match cli.command {
        Commands::Identify(args) => cli::identify::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, config_path).await,
    }
}
