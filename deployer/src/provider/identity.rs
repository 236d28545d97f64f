//! Instance id resolution
//!
//! Depending on API revision the control plane reports an instance's id as
//! `id`, `cvm_id` or `app_id`. The first present, non-empty field in
//! [`INSTANCE_ID_FIELDS`] order is canonical.

use serde_json::{Map, Value};

/// Id fields, highest precedence first
pub const INSTANCE_ID_FIELDS: [&str; 3] = ["id", "cvm_id", "app_id"];

/// Canonical instance id of a provider response, if it carries one
pub fn resolve_instance_id(fields: &Map<String, Value>) -> Option<String> {
    INSTANCE_ID_FIELDS
        .iter()
        .find_map(|field| fields.get(*field).and_then(id_text))
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
