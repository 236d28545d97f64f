//! Provider control-plane HTTP client

pub mod client;
pub mod cvms;

pub use client::{HttpClient, PHALA_API_BASE};
pub use cvms::attestation_view_url;
