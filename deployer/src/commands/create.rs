//! `create` command

use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use colored::Colorize;
use secrecy::SecretString;

use crate::app::options::AppOptions;
use crate::commands::RULE;
use crate::deploy::fsm::CreateState;
use crate::deploy::orchestrator::Progress;
use crate::deploy::poll::Readiness;
use crate::errors::DeployError;
use crate::models::deployment::CreateOutcome;
use crate::utils::default_instance_name;
use crate::workload::config::WorkloadInput;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Anthropic API key
    #[arg(long)]
    pub anthropic_key: Option<String>,

    /// OpenAI API key
    #[arg(long)]
    pub openai_key: Option<String>,

    /// Telegram bot token (from @BotFather)
    #[arg(long = "telegram-token")]
    pub telegram_token: Option<String>,

    /// Telegram user id allowed to talk to the bot
    #[arg(long = "telegram-user")]
    pub telegram_user: Option<String>,

    /// Telegram webhook URL; long polling when absent
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Gateway port inside the instance
    #[arg(long)]
    pub port: Option<u16>,

    /// Deployment name, defaults to `openclaw-<base36 millis>`
    #[arg(long)]
    pub name: Option<String>,

    /// Print the compose file and redacted config instead of deploying
    #[arg(long)]
    pub dry_run: bool,
}

impl CreateArgs {
    fn workload_input(&self) -> WorkloadInput {
        WorkloadInput {
            anthropic_key: self.anthropic_key.clone().map(SecretString::from),
            openai_key: self.openai_key.clone().map(SecretString::from),
            bot_token: self.telegram_token.clone().map(SecretString::from),
            allowed_principal: self.telegram_user.clone(),
            webhook_url: self.webhook_url.clone(),
            port: self.port,
        }
    }
}

/// Run the create command
pub async fn run(args: &CreateArgs, options: &AppOptions) -> Result<(), DeployError> {
    let input = args.workload_input();
    input.validate()?;

    let name = args
        .name
        .clone()
        .unwrap_or_else(|| default_instance_name(Utc::now()));
    let llm = input
        .llm_credentials()
        .iter()
        .map(|(provider, _)| provider.display_name())
        .collect::<Vec<_>>()
        .join(" + ");

    println!("{}", "Deploying OpenClaw to TEE...".bold());
    println!("   Name: {}", name);
    println!("   LLM: {}", llm);
    println!(
        "   Channel: Telegram (user {})",
        input.allowed_principal().unwrap_or("?")
    );
    println!();

    let orchestrator = options.orchestrator()?;

    if args.dry_run {
        let preview = orchestrator.preview(&input)?;
        println!("{}", "--- DRY RUN: Docker Compose ---".yellow());
        println!("{}", preview.compose);
        println!("{}", "--- Config (redacted) ---".yellow());
        println!("{}", serde_json::to_string_pretty(&preview.config)?);
        return Ok(());
    }

    let orchestrator = orchestrator.with_observer(Arc::new(print_progress));
    let outcome = orchestrator.create(&input, Some(&name)).await?;
    print_summary(&outcome, options);

    Ok(())
}

fn print_progress(progress: &Progress) {
    match progress {
        Progress::Stage(stage) => {
            let step = match stage {
                CreateState::AuthChecking => "Verifying Phala Cloud auth...",
                CreateState::NodeSelecting => "Finding available TEE node...",
                CreateState::Configuring => "Generating OpenClaw config...",
                CreateState::Provisioning => "Provisioning CVM on Phala Cloud...",
                CreateState::Activating => "Creating CVM...",
                CreateState::PollingReady => "Waiting for CVM to start...",
                CreateState::Enriching => "Getting connection info and attestation...",
                _ => return,
            };
            println!("{}", step.bold());
        }
        Progress::Authenticated { account } => {
            println!("   {} Logged in as: {}", "✓".green(), account);
        }
        Progress::NodeSelected { node, region } => {
            println!("   {} Using node: {} ({})", "✓".green(), node, region);
        }
        Progress::Provisioned { instance_id } => {
            println!(
                "   {} Provisioned: {}",
                "✓".green(),
                instance_id.as_deref().unwrap_or("ok")
            );
        }
        Progress::ActivationFallback { .. } => {
            println!("   CVM may have been created during provision");
        }
        Progress::Poll(attempt) => match &attempt.status {
            Some(status) => println!("   Status: {} ({}s)", status, attempt.elapsed.as_secs()),
            None => println!("   Waiting... ({}s)", attempt.elapsed.as_secs()),
        },
    }
}

fn print_summary(outcome: &CreateOutcome, options: &AppOptions) {
    let record = &outcome.record;

    match &outcome.readiness {
        Readiness::Ready { .. } => println!("   {} CVM is running!", "✓".green()),
        Readiness::TimedOut { .. } => {
            println!(
                "   {} CVM not ready after {} seconds. It may still be starting.",
                "!".yellow(),
                options.orchestrator.polling.budget().as_secs()
            );
        }
        Readiness::UnknownInstance => {
            println!(
                "   {} Phala Cloud reported no CVM id. Find the instance in the dashboard.",
                "!".yellow()
            );
        }
    }
    println!(
        "   Public URL: {}",
        outcome.public_url().unwrap_or("pending...")
    );
    match outcome.attestation_checksum() {
        Some(checksum) => println!("   Quote checksum: {}", checksum),
        None if outcome.attestation.is_some() => println!("   TEE attestation available"),
        None => println!("   Attestation not yet available (CVM may still be booting)"),
    }

    println!();
    println!("{}", RULE);
    println!("{}", "DEPLOYMENT COMPLETE".green().bold());
    println!("{}", RULE);
    let instance_id = record.instance_id.as_deref().unwrap_or("unknown");
    println!("Instance ID:    {}", instance_id);
    println!("Name:           {}", record.name);
    println!("Gateway Token:  {}", record.gateway_token);
    println!("TEE Provider:   Phala Cloud (Intel TDX)");
    println!();
    println!("Next steps:");
    println!("  1. Message your Telegram bot, it should respond");
    println!("  2. Check status: tee-deploy status --cvm-id {}", instance_id);
    println!(
        "  3. View attestation: tee-deploy status --cvm-id {} --attestation",
        instance_id
    );
    println!("{}", RULE);
    println!(
        "Deployment saved to {}/{}.json",
        options.layout.deployments_dir().path().display(),
        record.name
    );
}
