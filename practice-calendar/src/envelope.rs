//! Normalizes the backend's `{success, data, message}` response envelope.
//!
//! Depending on the endpoint the payload sits at `data`, at `data.data`, or the
//! body is the bare payload. Callers decode through [`unwrap_envelope`] once,
//! at the client boundary, and never look at the envelope again.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::EnvelopeError;

const ENVELOPE_KEYS: [&str; 3] = ["success", "data", "message"];

/// Decodes `body` into `T`, peeling off every envelope layer on the way.
pub fn unwrap_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T, EnvelopeError> {
    let value: Value = serde_json::from_slice(body)?;
    Ok(serde_json::from_value(unwrap_value(value)?)?)
}

/// The outermost object counts as an envelope as soon as it has a `success`
/// flag. Nested objects only count when they have nothing but envelope keys,
/// so a payload that merely contains a `data` field is left alone.
pub fn unwrap_value(value: Value) -> Result<Value, EnvelopeError> {
    let mut payload = match value {
        Value::Object(mut map) if map.contains_key("success") || is_envelope_shaped(&map) => {
            open(&mut map)?
        }
        other => return Ok(other),
    };

    loop {
        payload = match payload {
            Value::Object(mut map) if is_envelope_shaped(&map) => open(&mut map)?,
            other => return Ok(other),
        };
    }
}

fn is_envelope_shaped(map: &Map<String, Value>) -> bool {
    map.contains_key("data") && map.keys().all(|key| ENVELOPE_KEYS.contains(&key.as_str()))
}

fn open(map: &mut Map<String, Value>) -> Result<Value, EnvelopeError> {
    if map.get("success") == Some(&Value::Bool(false)) {
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no message given");
        return Err(EnvelopeError::Rejected(message.to_string()));
    }

    match map.remove("data") {
        None | Some(Value::Null) => Err(EnvelopeError::MissingData),
        Some(data) => Ok(data),
    }
}
