//! CLI Module
//!
//! Command-line interface for costcrab using Clap v4. The default command
//! serves the stdio transport; the rest are one-shot invocations of the
//! same five operations for shell use.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// costcrab - AWS Pricing Calculator tools for AI agents
#[derive(Parser, Debug)]
#[command(name = "costcrab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the JSON-RPC tool transport over stdin/stdout (default)
    Serve,

    /// Serve the JSON-RPC tool transport over HTTP
    Gateway {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Search the service catalog
    Search {
        /// Keyword to search for
        query: String,
    },

    /// Show a service's configuration schema
    Schema {
        /// Service code, e.g. 'lambda'
        service_code: String,
    },

    /// Configure a service and compute its cost
    Configure {
        /// Service code, e.g. 'lambda'
        service_code: String,

        /// AWS region code
        #[arg(short, long)]
        region: Option<String>,

        /// Input as key=value; value may be JSON (repeatable)
        #[arg(short, long = "input")]
        inputs: Vec<String>,
    },

    /// Create and save an estimate, printing the shareable link
    Estimate {
        /// Estimate name
        name: String,

        /// Services as a JSON array, or @path to a JSON file
        #[arg(short, long)]
        services: String,
    },

    /// Load a saved estimate by id or shareable link
    Load {
        /// Estimate id or link containing id=...
        estimate_id: String,
    },

    /// Show the effective configuration
    Config,
}

/// Main CLI entry point
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = commands::load_config(cli.config.as_deref())?;
    if cli.debug {
        config.logging.level = "debug".to_string();
    }
    let _log_guard = crate::logging::init(&config.logging)?;
    config.validate()?;

    match cli.command {
        None | Some(Commands::Serve) => commands::cmd_serve(&config).await,
        Some(Commands::Gateway { bind, port }) => commands::cmd_gateway(&config, bind, port).await,
        Some(Commands::Search { query }) => commands::cmd_search(&config, &query).await,
        Some(Commands::Schema { service_code }) => {
            commands::cmd_schema(&config, &service_code).await
        }
        Some(Commands::Configure {
            service_code,
            region,
            inputs,
        }) => commands::cmd_configure(&config, &service_code, region.as_deref(), &inputs).await,
        Some(Commands::Estimate { name, services }) => {
            commands::cmd_estimate(&config, &name, &services).await
        }
        Some(Commands::Load { estimate_id }) => commands::cmd_load(&config, &estimate_id).await,
        Some(Commands::Config) => commands::cmd_config(&config),
    }
}
