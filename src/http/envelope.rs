//! Response envelope decoding.
//!
//! Every response body is a JSON object of the form
//!
//! ```json
//! { "succeeded": true, "resp_data": { ... } }
//! { "succeeded": false, "code": 10001, "error": "...", "info": "..." }
//! ```
//!
//! `resp_data` may be an object, an array, a primitive, `null`, or missing.
//! It is kept as a [`serde_json::Value`] until the caller's expected type is
//! known, then decoded with serde. Wire field names are snake_case, so plain
//! `#[derive(Deserialize)]` structs match them; unknown fields are ignored and
//! fields marked `#[serde(default)]` may be missing.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{classify, ApiError, NETWORK_ERROR_CODE, UNKNOWN_ERROR_MESSAGE};

/// A body that could not be read as an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response body is not a JSON object")]
    NotAnObject,

    #[error("envelope field `{0}` has an unexpected type")]
    BadField(&'static str),
}

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Succeeded(Payload),
    Failed { code: i64, message: String },
}

/// The `resp_data` of a successful envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Missing or `null`.
    Absent,
    /// Boolean, number or string.
    Primitive(Value),
    /// Object or array.
    Structured(Value),
}

impl From<Option<Value>> for Payload {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Payload::Absent,
            Some(v @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => {
                Payload::Primitive(v)
            }
            Some(v) => Payload::Structured(v),
        }
    }
}

impl Payload {
    /// Decode into the caller's type. `Absent` yields `None`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Option<T>, serde_json::Error> {
        match self {
            Payload::Absent => Ok(None),
            Payload::Primitive(v) => coerce_primitive(v).map(Some),
            Payload::Structured(v) => serde_json::from_value(v).map(Some),
        }
    }
}

/// Parse a raw body as an envelope without interpreting `resp_data`.
pub fn parse(raw: &[u8]) -> Result<Envelope, EnvelopeError> {
    let value: Value = serde_json::from_slice(raw)?;
    let Value::Object(mut obj) = value else {
        return Err(EnvelopeError::NotAnObject);
    };

    let succeeded = match obj.get("succeeded") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(EnvelopeError::BadField("succeeded")),
    };

    if succeeded {
        return Ok(Envelope::Succeeded(Payload::from(obj.remove("resp_data"))));
    }

    let code = read_code(&obj)?;
    let message = read_message(&obj, "error")
        .or_else(|| read_message(&obj, "info"))
        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());

    Ok(Envelope::Failed { code, message })
}

impl Envelope {
    /// Turn the envelope into the call's result.
    ///
    /// Business failures are classified; a `resp_data` that does not fit `T`
    /// is a network failure, since the response was not what the endpoint
    /// promises.
    pub fn into_result<T: DeserializeOwned>(
        self,
        request_id: Option<&str>,
    ) -> Result<Option<T>, ApiError> {
        match self {
            Envelope::Failed { code, message } => Err(classify(code, &message, request_id)),
            Envelope::Succeeded(payload) => payload.decode().map_err(|e| {
                ApiError::network(
                    NETWORK_ERROR_CODE,
                    format!("failed to decode resp_data: {}", e),
                    request_id.map(str::to_string),
                    None,
                    Some(Box::new(e)),
                )
            }),
        }
    }
}

/// Decode a raw body straight into the caller's type.
///
/// A body that is not an envelope becomes a network failure.
pub fn decode<T: DeserializeOwned>(
    raw: &[u8],
    request_id: Option<&str>,
) -> Result<Option<T>, ApiError> {
    match parse(raw) {
        Ok(envelope) => envelope.into_result(request_id),
        Err(e) => Err(ApiError::network(
            NETWORK_ERROR_CODE,
            format!("failed to parse response: {}", e),
            request_id.map(str::to_string),
            None,
            Some(Box::new(e)),
        )),
    }
}

fn read_code(obj: &Map<String, Value>) -> Result<i64, EnvelopeError> {
    match obj.get("code") {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n.as_i64().ok_or(EnvelopeError::BadField("code")),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| EnvelopeError::BadField("code")),
        Some(_) => Err(EnvelopeError::BadField("code")),
    }
}

fn read_message(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// Primitives decode directly when the types line up; otherwise a number or
// bool may be read as its string form and a string may be read as the
// primitive it spells ("42", "true").
fn coerce_primitive<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    let err = match serde_json::from_value::<T>(value.clone()) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    let alternate = match value {
        Value::String(s) => serde_json::from_str::<Value>(s.trim())
            .ok()
            .filter(|v| !v.is_object() && !v.is_array()),
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    };

    alternate
        .and_then(|v| serde_json::from_value(v).ok())
        .ok_or(err)
}
