//! `status` command

use clap::Args;
use cloud_api::CvmListing;
use colored::Colorize;
use serde_json::Value;

use crate::app::options::AppOptions;
use crate::deploy::orchestrator::{InspectDetail, Orchestrator};
use crate::errors::DeployError;
use crate::http::attestation_view_url;
use crate::models::deployment::InstanceReport;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Instance id
    #[arg(long = "cvm-id", required_unless_present = "list")]
    pub cvm_id: Option<String>,

    /// Include the TEE attestation
    #[arg(long)]
    pub attestation: bool,

    /// Include resource usage
    #[arg(long)]
    pub stats: bool,

    /// List local deployments and every instance on the provider
    #[arg(long, conflicts_with = "cvm_id")]
    pub list: bool,
}

/// Run the status command
pub async fn run(args: &StatusArgs, options: &AppOptions) -> Result<(), DeployError> {
    let orchestrator = options.orchestrator()?;

    match &args.cvm_id {
        Some(id) if !args.list => {
            let detail = InspectDetail {
                stats: args.stats,
                attestation: args.attestation,
            };
            let report = orchestrator.inspect(id, detail).await;
            print_report(&report, options.provider.base_url.as_str());
            Ok(())
        }
        _ => list(&orchestrator).await,
    }
}

async fn list(orchestrator: &Orchestrator) -> Result<(), DeployError> {
    println!("{}", "Deployments:".bold());
    println!();

    for record in orchestrator.list_local().await? {
        println!("  {}", record.name.bold());
        println!("    CVM ID: {}", record.instance_id.as_deref().unwrap_or("?"));
        println!("    Created: {}", record.created_at.to_rfc3339());
        println!(
            "    Telegram user: {}",
            record.allowed_principal.as_deref().unwrap_or("?")
        );
        println!();
    }

    println!("{}", "Live CVMs on Phala:".bold());
    match orchestrator.list_remote().await? {
        CvmListing::Instances(instances) => {
            for cvm in instances {
                println!("  {}: {}", cvm.label(), cvm.status_text());
            }
        }
        CvmListing::Other(value) => println!("  {}", value),
    }

    Ok(())
}

fn text_field<'a>(value: &'a Value, field: &str) -> &'a str {
    value.get(field).and_then(Value::as_str).unwrap_or("?")
}

fn usage(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "?".to_string(),
        Some(other) => other.to_string(),
    }
}

fn print_report(report: &InstanceReport, base_url: &str) {
    println!("{} {}", "Status for CVM:".bold(), report.instance_id);
    println!();

    match &report.instance {
        Ok(cvm) => {
            let status = cvm
                .get("status")
                .or_else(|| cvm.get("state"))
                .and_then(Value::as_str)
                .unwrap_or("?");
            println!("  Name:    {}", text_field(cvm, "name"));
            println!("  Status:  {}", status);
            println!("  Created: {}", text_field(cvm, "created_at"));
            println!("  Image:   {}", text_field(cvm, "image"));
        }
        Err(e) => println!("  {} {}", "✗".red(), e),
    }

    if let Ok(state) = &report.state {
        if let Ok(json) = serde_json::to_string(state) {
            println!("  State:   {}", json);
        }
    }
    if let Ok(network) = &report.network {
        if let Ok(json) = serde_json::to_string(network) {
            println!("  Network: {}", json);
        }
    }

    if let Some(stats) = &report.stats {
        println!();
        println!("{}", "Resource usage:".bold());
        match stats {
            Ok(stats) => {
                println!("  CPU:    {}", usage(&stats.cpu_usage));
                println!("  Memory: {}", usage(&stats.memory_usage));
                println!("  Disk:   {}", usage(&stats.disk_usage));
            }
            Err(e) => println!("  {} {}", "✗".red(), e),
        }
    }

    if let Some(attestation) = &report.attestation {
        println!();
        println!("{}", "TEE Attestation:".bold());
        match attestation {
            Ok(att) => {
                println!("  Checksum:  {}", att.checksum().unwrap_or("?"));
                println!("  TEE type:  {}", att.tee_type.as_deref().unwrap_or("Intel TDX"));
                println!("  Verified:  {}", usage(&att.verified));
                println!("  Timestamp: {}", att.issued_at().unwrap_or("?"));

                if let Some(checksum) = att.checksum() {
                    println!();
                    println!("  Verify independently:");
                    println!("  curl -s {}", attestation_view_url(base_url, checksum));
                }
            }
            Err(e) => println!("  {} {}", "✗".red(), e),
        }
    }
}
