//! Session payload and bag storage keys

use serde_json::{Map, Value};

/// The working session payload, keyed by bag storage key
pub type SessionPayload = Map<String, Value>;

/// Storage key of the attribute bag
pub const ATTRIBUTES_KEY: &str = "_sf2_attributes";
/// Storage key of the flash message bag
pub const FLASHES_KEY: &str = "_symfony_flashes";
/// Storage key of the metadata bag
pub const METADATA_KEY: &str = "_sf2_meta";
/// Attribute holding the id of the user owning the session
pub const UID_ATTRIBUTE: &str = "uid";

/// Loose emptiness: null, false, 0, "", "0", [] and {} carry no user data
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Owner user id recorded in the attribute bag, 0 for anonymous sessions
pub fn owner_uid(payload: &SessionPayload) -> i64 {
    payload
        .get(ATTRIBUTES_KEY)
        .and_then(|bag| bag.get(UID_ATTRIBUTE))
        .and_then(|uid| match uid {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .unwrap_or(0)
}
