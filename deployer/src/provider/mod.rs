//! Provider integration: the gateway contract and instance identity

pub mod gateway;
pub mod identity;

pub use gateway::{InstanceDescriptor, ProviderGateway};
