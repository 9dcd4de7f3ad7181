//! Response classification
//!
//! Decision order:
//! 1. transport failure: `Network` with `context.originalError`
//! 2. 2xx: decode the payload
//! 3. 400 with `error.name == "ValidationException"` and `error.errors[]`: `Validation`
//! 4. 401 / 403: `Authentication`
//! 5. anything else: `Network`

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{ErrorDetails, InventoryError, Result, ValidationErrorItem, ValidationFailure};
use crate::transport::{RawResponse, TransportError};

pub const NETWORK_FAILURE_MESSAGE: &str = "Network request failed";
pub const VALIDATION_EXCEPTION: &str = "ValidationException";

// Raw bodies echoed into error context are cut to this many bytes
const BODY_EXCERPT_LIMIT: usize = 512;

/// Fields pulled out of a JSON error body
#[derive(Debug, Default)]
struct ErrorBody {
    name: Option<String>,
    message: Option<String>,
    request_id: Option<String>,
    errors: Option<Value>,
}

impl ErrorBody {
    /// Accepts `{error: {...}}`, `{error: "msg"}` and top-level `{message}`
    fn from_value(value: &Value) -> Self {
        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);

        let mut body = match value.get("error") {
            Some(Value::Object(error)) => Self {
                name: text(error.get("name")),
                message: text(error.get("message")),
                request_id: text(error.get("requestId")),
                errors: error.get("errors").cloned(),
            },
            Some(Value::String(message)) => Self {
                message: Some(message.clone()),
                ..Self::default()
            },
            _ => Self::default(),
        };

        if body.message.is_none() {
            body.message = text(value.get("message"));
        }
        if body.request_id.is_none() {
            body.request_id = text(value.get("requestId"));
        }
        body
    }
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(BODY_EXCERPT_LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}

/// Turn a raw transport outcome into a decoded payload or a typed error
pub fn classify<T: DeserializeOwned>(
    outcome: std::result::Result<RawResponse, TransportError>,
) -> Result<T> {
    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            return Err(InventoryError::Network(
                ErrorDetails::new(NETWORK_FAILURE_MESSAGE).with_original_error(err.message),
            ));
        }
    };

    if (200..300).contains(&response.status) {
        return decode_success(response);
    }

    Err(classify_failure(response))
}

fn decode_success<T: DeserializeOwned>(response: RawResponse) -> Result<T> {
    let decode_error = |err: serde_json::Error| {
        InventoryError::Network(
            ErrorDetails::new("Failed to decode response payload")
                .with_status(response.status)
                .with_request_id(response.request_id.clone())
                .with_original_error(err.to_string())
                .with_context("body", excerpt(&response.body)),
        )
    };

    let payload = if response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&response.body).map_err(decode_error)?
    };

    serde_json::from_value(payload).map_err(decode_error)
}

fn classify_failure(response: RawResponse) -> InventoryError {
    let status = response.status;

    let parsed = match serde_json::from_slice::<Value>(&response.body) {
        Ok(value) => value,
        Err(_) => {
            return InventoryError::Network(
                ErrorDetails::new(format!("Request failed with status {}", status))
                    .with_status(status)
                    .with_request_id(response.request_id)
                    .with_context("body", excerpt(&response.body)),
            );
        }
    };

    let body = ErrorBody::from_value(&parsed);
    let request_id = body.request_id.clone().or(response.request_id);

    // Set when a ValidationException body carries unreadable `errors`
    let mut malformed_errors = None;

    if status == 400 && body.name.as_deref() == Some(VALIDATION_EXCEPTION) {
        if let Some(errors) = body.errors.clone() {
            match serde_json::from_value::<Vec<ValidationErrorItem>>(errors) {
                Ok(items) => {
                    let details = ErrorDetails::new(
                        body.message
                            .unwrap_or_else(|| "Request validation failed".to_string()),
                    )
                    .with_status(status)
                    .with_request_id(request_id);
                    return InventoryError::Validation(ValidationFailure::new(details, items));
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        request_id = ?request_id,
                        "ValidationException with unreadable errors, reporting as network error"
                    );
                    malformed_errors = Some(err.to_string());
                }
            }
        }
    }

    match status {
        401 | 403 => InventoryError::Authentication(
            ErrorDetails::new(
                body.message
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            )
            .with_status(status)
            .with_request_id(request_id),
        ),
        _ => {
            let mut details = ErrorDetails::new(
                body.message
                    .unwrap_or_else(|| format!("Request failed with status {}", status)),
            )
            .with_status(status)
            .with_request_id(request_id);
            if let Some(reason) = malformed_errors {
                details = details
                    .with_original_error(reason)
                    .with_context("validationErrors", body.errors.unwrap_or(Value::Null));
            }
            InventoryError::Network(details.with_context("response", parsed))
        }
    }
}
