//! Purpose: Round-trip the engine's opaque config blob between wire JSON and a mapping.
//! Exports: `decode_config`, `encode_config`, `json_type_name`.
//! Role: Schema-agnostic codec; validating config contents is the caller's job.
//! Invariants: Every failure is a config-domain error with the underlying cause attached.
//! Invariants: Emitted key order is not part of the contract; only content is.

use serde_json::{Map, Value};

use crate::core::error::{ConfigCode, Error};

/// Decode a UTF-8 JSON config document into a mapping. The top-level value
/// must be an object; any other shape is a `DecodeFailed` whose message names
/// the type actually found.
pub fn decode_config(raw: &[u8]) -> Result<Map<String, Value>, Error> {
    let text = std::str::from_utf8(raw).map_err(|err| {
        Error::new(ConfigCode::DecodeFailed)
            .with_message("config is not valid utf-8")
            .with_source(err)
    })?;
    let value: Value = serde_json::from_str(text).map_err(|err| {
        Error::new(ConfigCode::DecodeFailed)
            .with_message("decoding config failed")
            .with_source(err)
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::new(ConfigCode::DecodeFailed)
            .with_message(format!("unexpected config type: {}", json_type_name(&other)))
            .with_hint("Config documents must be a JSON object at the top level.")),
    }
}

/// Encode a config value as compact JSON. Accepts any JSON fragment at the
/// top level for symmetry with decode, though callers normally pass objects.
pub fn encode_config(value: &Value) -> Result<String, Error> {
    serde_json::to_string(value).map_err(|err| {
        Error::new(ConfigCode::EncodeFailed)
            .with_message("encoding config failed")
            .with_source(err)
    })
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
