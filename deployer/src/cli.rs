//! CLI argument parsing with clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use crate::app::options::{AppOptions, ProviderCredentials};
use crate::commands;
use crate::errors::DeployError;
use crate::logs::{init_logging, LogLevel, LogOptions};
use crate::storage::settings::Settings;

/// One-shot OpenClaw deployment into Phala Cloud confidential VMs
#[derive(Parser, Debug)]
#[command(
    name = "tee-deploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the settings file
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Phala Cloud API token
    #[arg(
        long = "phala-token",
        global = true,
        env = "PHALA_API_TOKEN",
        hide_env_values = true
    )]
    pub phala_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy a new OpenClaw instance
    Create(commands::create::CreateArgs),

    /// Tear down an instance
    Destroy(commands::destroy::DestroyArgs),

    /// Show instance status, or list deployments
    Status(commands::status::StatusArgs),

    /// Serve the deployment REST API
    Serve(commands::serve::ServeArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<(), DeployError> {
        let Cli {
            config,
            log_level,
            json_logs,
            phala_token,
            command,
        } = self;

        if let Command::Version = command {
            return commands::version::run();
        }

        let settings = Settings::load(config.as_deref()).await?;
        init_logging(LogOptions {
            log_level: log_level.unwrap_or(settings.log_level),
            json_format: json_logs,
        })?;

        let options = AppOptions::resolve(
            &settings,
            ProviderCredentials {
                token: phala_token.map(SecretString::from),
            },
        )?;

        match command {
            Command::Create(args) => commands::create::run(&args, &options).await,
            Command::Destroy(args) => commands::destroy::run(&args, &options).await,
            Command::Status(args) => commands::status::run(&args, &options).await,
            Command::Serve(args) => commands::serve::run(&args, options).await,
            Command::Version => commands::version::run(),
        }
    }
}
