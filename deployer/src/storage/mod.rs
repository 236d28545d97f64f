//! Local storage: settings, layout and deployment records

pub mod layout;
pub mod records;
pub mod settings;
