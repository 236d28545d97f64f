//! Phala Cloud control-plane wire models

pub mod models;

pub use models::*;
