//! # weather-agent CLI
//!
//! Command-line interface for the weather agent.
//!
//! ## Usage
//!
//! - `weather-agent` / `weather-agent chat` - Chat with the agent
//! - `weather-agent session` - Chat inside a traced session
//! - `weather-agent serve` - Run the agent runtime HTTP service
//! - `weather-agent invoke` - Invoke a deployed agent runtime
//! - `weather-agent tools` - Show available tools

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod interactive;

use commands::{
    chat_command, invoke_command, serve_command, session_command, tools_command, InvokeArgs,
};
use crate::config::{AppConfig, CliConfigLoader};
use weather_agent_core::init_telemetry;

/// weather-agent - A weather forecasting agent on Amazon Bedrock
#[derive(Parser)]
#[command(name = "weather-agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A traced weather forecasting agent on Amazon Bedrock")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bedrock model id override
    #[arg(long, global = true)]
    model: Option<String>,

    /// AWS region override
    #[arg(long, global = true)]
    region: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the weather agent
    Chat,

    /// Chat inside a traced session
    Session {
        /// Session id; generated when absent
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Run the agent runtime HTTP service
    Serve {
        /// Bind host override
        #[arg(long)]
        host: Option<String>,

        /// Bind port override
        #[arg(long)]
        port: Option<u16>,
    },

    /// Invoke a deployed agent runtime
    Invoke {
        /// Agent runtime ARN
        #[arg(long)]
        arn: Option<String>,

        /// Endpoint qualifier
        #[arg(long)]
        qualifier: Option<String>,

        /// Prompt to send
        #[arg(long, default_value = commands::invoke::DEFAULT_PROMPT)]
        prompt: String,

        /// Runtime session id; generated when absent
        #[arg(long)]
        session_id: Option<String>,

        /// Bearer token for the agent runtime
        #[arg(long, env = "AGENTCORE_BEARER_TOKEN", hide_env_values = true)]
        bearer_token: Option<String>,
    },

    /// Show available tools
    Tools,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(region) = &cli.region {
        loader = loader.with_region_override(region.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config: AppConfig = build_config_loader(&cli)
        .load()
        .context("Failed to load configuration")?;

    // Flushes spans on drop
    let _telemetry = init_telemetry(&config.telemetry, cli.verbose)
        .context("Failed to initialize telemetry")?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => chat_command(&config).await,
        Commands::Session { session_id } => session_command(&config, session_id).await,
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.runtime.host = host;
            }
            if let Some(port) = port {
                config.runtime.port = port;
            }
            serve_command(&config).await
        }
        Commands::Invoke {
            arn,
            qualifier,
            prompt,
            session_id,
            bearer_token,
        } => {
            let args = InvokeArgs {
                arn,
                qualifier,
                prompt,
                session_id,
                bearer_token,
            };
            invoke_command(&config, args).await
        }
        Commands::Tools => tools_command().await,
    }
}
