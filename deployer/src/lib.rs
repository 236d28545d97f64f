//! tee-deploy library
//!
//! Core modules for deploying OpenClaw into Phala Cloud confidential VMs.

pub mod app;
pub mod cli;
pub mod commands;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod provider;
pub mod server;
pub mod storage;
pub mod utils;
pub mod workload;
