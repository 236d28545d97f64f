//! Subcommand implementations

pub mod create;
pub mod destroy;
pub mod serve;
pub mod status;
pub mod version;

const RULE: &str = "═══════════════════════════════════════════";
