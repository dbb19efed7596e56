//! Response decoding and error-body normalization.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::error::{ApiError, Error};

/// Message used when an error body is missing or has no recognizable shape.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Key the backend uses for errors not tied to a single field.
const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A successful response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Decoded body; `Value::Null` when the response had none.
    pub body: Value,
}

impl ApiResponse {
    /// Decode the body into a caller type.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, Error> {
        Ok(serde_json::from_value(self.body)?)
    }
}

/// Turn a transport response into a success or a structured failure.
pub(crate) async fn decode(response: reqwest::Response) -> Result<ApiResponse, Error> {
    let status = response.status();
    let bytes = response.bytes().await?;
    trace!(%status, len = bytes.len(), "response received");

    if status.is_success() {
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        return Ok(ApiResponse { status, body });
    }

    let body = serde_json::from_slice::<Value>(&bytes).ok();
    Err(Error::Api(ApiError::new(status.as_u16(), body)))
}

/// Build a human-readable message from an error body.
///
/// Recognized shapes, in order: `{"detail": ..}`, `{"error": ..}`, then a map
/// of field name to a message or list of messages.
pub fn error_message(body: &Value) -> String {
    let Some(object) = body.as_object() else {
        return UNEXPECTED_ERROR.to_string();
    };

    for key in ["detail", "error"] {
        if let Some(message) = object.get(key).and_then(message_text) {
            return message;
        }
    }

    let lines: Vec<String> = object
        .iter()
        .filter_map(|(field, value)| {
            let text = message_text(value)?;
            if field == NON_FIELD_ERRORS {
                Some(text)
            } else {
                Some(format!("{}: {}", field, text))
            }
        })
        .collect();

    if lines.is_empty() {
        UNEXPECTED_ERROR.to_string()
    } else {
        lines.join("\n")
    }
}

/// Extract field-keyed messages for form highlighting.
pub fn field_errors(body: &Value) -> FieldErrors {
    let Some(object) = body.as_object() else {
        return FieldErrors::new();
    };

    object
        .iter()
        .filter(|(field, _)| field.as_str() != "detail" && field.as_str() != "error")
        .filter_map(|(field, value)| Some((field.clone(), messages(value)?)))
        .collect()
}

fn messages(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    }
}

fn message_text(value: &Value) -> Option<String> {
    messages(value)
        .filter(|m| !m.is_empty())
        .map(|m| m.join(", "))
}
