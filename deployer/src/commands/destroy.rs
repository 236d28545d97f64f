//! `destroy` command

use clap::{ArgGroup, Args};
use colored::Colorize;

use crate::app::options::AppOptions;
use crate::errors::DeployError;
use crate::models::deployment::{DestroyOutcome, DestroyTarget};

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["cvm_id", "name"])))]
pub struct DestroyArgs {
    /// Instance id
    #[arg(long = "cvm-id")]
    pub cvm_id: Option<String>,

    /// Local deployment name
    #[arg(long)]
    pub name: Option<String>,

    /// Actually destroy; otherwise only show what would be destroyed
    #[arg(long)]
    pub force: bool,
}

impl DestroyArgs {
    pub fn target(&self) -> Result<DestroyTarget, DeployError> {
        match (&self.cvm_id, &self.name) {
            (Some(id), _) => Ok(DestroyTarget::Id(id.clone())),
            (None, Some(name)) => Ok(DestroyTarget::Name(name.clone())),
            (None, None) => Err(DeployError::Usage("Need --cvm-id or --name".to_string())),
        }
    }
}

/// Run the destroy command
pub async fn run(args: &DestroyArgs, options: &AppOptions) -> Result<(), DeployError> {
    let target = args.target()?;
    let orchestrator = options.orchestrator()?;

    if let DestroyTarget::Name(name) = &target {
        let record = orchestrator.store().get(name).await?;
        if let Some(instance_id) = &record.instance_id {
            println!("Resolved {} -> CVM {}", name, instance_id);
        }
    }

    match orchestrator.destroy(&target, args.force).await? {
        DestroyOutcome::Planned { instance_id } => {
            println!("{} About to DESTROY CVM: {}", "!".yellow(), instance_id.bold());
            println!("   This will permanently delete the instance and all data.");
            println!("   Run with --force to confirm.");
        }
        DestroyOutcome::Destroyed {
            stop_error,
            removed_record,
            ..
        } => {
            match stop_error {
                None => println!("   Stopped."),
                Some(e) => println!("   Stop failed (may already be stopped): {}", e),
            }
            println!("   {} Deleted.", "✓".green());
            if removed_record.is_some() {
                println!("   Removed local record.");
            }
            println!();
            println!("{}", "CVM destroyed. All data wiped from TEE.".green());
        }
    }

    Ok(())
}
