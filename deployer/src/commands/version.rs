//! `version` command

use crate::errors::DeployError;
use crate::utils::version_info;

/// Print version information as JSON
pub fn run() -> Result<(), DeployError> {
    println!("{}", serde_json::to_string_pretty(&version_info())?);
    Ok(())
}
