//! REST facade models for tee-deploy

pub mod models;

pub use models::*;
