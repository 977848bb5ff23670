//! Command-line entry point.
//!
//! # Usage
//!
//! ```bash
//! # Bring up logger, database and cache and report the result
//! cargo run -- check
//!
//! # Print the effective configuration (passwords masked)
//! cargo run -- config
//!
//! # Store and read a JSON value through the MessagePack helpers
//! cargo run -- cache set greeting '{"text":"hello"}' --ttl 60
//! cargo run -- cache get greeting
//! ```
//!
//! Configuration comes from the environment (a `.env` file is honored) or from
//! the JSON file given with `--config`.

use service_tools::bootstrap;
use service_tools::config::{self, Config};
use service_tools::infrastructure::cache::{Cache, CacheError};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Duration;

/// Startup helpers for logger, database and cache.
#[derive(Parser)]
#[command(name = "service-tools")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read configuration from a JSON file instead of the environment
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize every handle and report the result
    Check,

    /// Print the effective configuration
    Config,

    /// Cache operations
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Read a key and print it as JSON
    Get { key: String },

    /// Store a JSON value under a key
    Set {
        key: String,
        /// Value as JSON
        value: String,
        /// Expiration in seconds (0 = none)
        #[arg(long, default_value_t = 0)]
        ttl: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_json_file(path)?;
            config.validate()?;
            config
        }
        None => config::load_from_env()?,
    };

    match cli.command {
        Commands::Check => check(&config).await,
        Commands::Config => {
            bootstrap::install_logger(&config.logger);
            config.print_summary();
            Ok(())
        }
        Commands::Cache { action } => {
            bootstrap::install_logger(&config.logger);
            handle_cache_action(action, &config).await
        }
    }
}

/// Runs the full startup sequence.
async fn check(config: &Config) -> Result<()> {
    println!("{}", "Checking startup sequence".bright_blue().bold());

    match bootstrap::init(config).await {
        Ok(state) => {
            let degraded = state.logger.is_degraded();
            let logger_status = if degraded {
                "degraded (no file sink)".yellow()
            } else {
                "ok".green()
            };
            println!("  logger:   {}", logger_status);
            println!("  database: {}", "ok".green());
            println!("  cache:    {}", "ok".green());
            state.db.close().await;
            Ok(())
        }
        Err(e) => {
            println!("  {}: {}", e.component(), "failed".red());
            Err(e).context("Startup check failed")
        }
    }
}

/// Dispatches cache subcommands.
async fn handle_cache_action(action: CacheAction, config: &Config) -> Result<()> {
    let (cache, _) = Cache::connect(&config.cache)
        .await
        .context("Failed to connect to cache")?;

    match action {
        CacheAction::Get { key } => match cache.get_struct::<serde_json::Value>(&key).await {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            Err(CacheError::NotFound(_)) => println!("{}", format!("{key}: not found").yellow()),
            Err(e) => return Err(e.into()),
        },
        CacheAction::Set { key, value, ttl } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).context("Value must be valid JSON")?;
            cache
                .set_struct(&key, &value, Duration::from_secs(ttl))
                .await?;
            println!("{} {}", "stored".green(), key);
        }
    }

    Ok(())
}
