use std::fmt::Display;

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Opaque node id used in payloads: base64 of `"Type:pk"`.
pub fn to_global_id(type_name: &str, pk: impl Display) -> String {
    STANDARD.encode(format!("{}:{}", type_name, pk))
}

/// Split a global id back into `(type, pk)`. `None` if it is not one.
pub fn from_global_id(global_id: &str) -> Option<(String, String)> {
    let raw = STANDARD.decode(global_id).ok()?;
    let raw = String::from_utf8(raw).ok()?;
    let (type_name, pk) = raw.split_once(':')?;
    Some((type_name.to_string(), pk.to_string()))
}
