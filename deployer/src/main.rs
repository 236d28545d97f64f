//! tee-deploy - Entry Point
//!
//! Deploys OpenClaw into Phala Cloud confidential VMs, from the command line
//! or through a small REST facade.

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use tee_deploy::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}
