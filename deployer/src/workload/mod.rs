//! Workload generation: secrets, configuration documents and the bootstrap artifact

pub mod bootstrap;
pub mod config;
pub mod secrets;
