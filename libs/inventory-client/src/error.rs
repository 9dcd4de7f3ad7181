//! Error taxonomy for inventory client operations
//!
//! Every failed call surfaces exactly one [`InventoryError`] variant. The
//! variants share a common [`ErrorDetails`] payload; validation failures
//! additionally carry the server's structured per-property detail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type alias for inventory client operations
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Fields shared by every error kind
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    /// Human-readable message
    pub message: String,
    /// HTTP status, when a response was received
    pub status_code: Option<u16>,
    /// Server-assigned request identifier, when one was reported
    pub request_id: Option<String>,
    /// When the error was constructed
    pub timestamp: DateTime<Utc>,
    /// Message of the underlying failure, if any
    pub original_error: Option<String>,
    /// Additional structured context
    pub context: Map<String, Value>,
}

impl ErrorDetails {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            request_id: None,
            timestamp: Utc::now(),
            original_error: None,
            context: Map::new(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Record the underlying failure, mirrored into `context.originalError`
    pub fn with_original_error(mut self, original: impl Into<String>) -> Self {
        let original = original.into();
        self.context
            .insert("originalError".to_string(), Value::String(original.clone()));
        self.original_error = Some(original);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// One server-side validation failure for a single property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorItem {
    pub property: String,
    /// Constraint messages, in the order the server reported them
    #[serde(default, deserialize_with = "constraint_messages")]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub children: Vec<ValidationErrorItem>,
}

impl ValidationErrorItem {
    pub fn new(property: impl Into<String>, constraints: Vec<String>) -> Self {
        Self {
            property: property.into(),
            constraints,
            children: Vec::new(),
        }
    }
}

/// Accepts either `["msg", ...]` or `{"rule": "msg", ...}`
fn constraint_messages<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let messages = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(message_text).collect(),
        Value::Object(map) => map.into_iter().map(|(_, v)| message_text(v)).collect(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "constraints must be an array or an object, got {}",
                other
            )));
        }
    };
    Ok(messages)
}

fn message_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Validation failure reported by the server (or raised while encoding locally)
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub details: ErrorDetails,
    pub validation_errors: Vec<ValidationErrorItem>,
}

impl ValidationFailure {
    pub fn new(details: ErrorDetails, validation_errors: Vec<ValidationErrorItem>) -> Self {
        Self {
            details,
            validation_errors,
        }
    }

    /// Every constraint message, in property order then constraint order
    pub fn all_messages(&self) -> Vec<String> {
        self.validation_errors
            .iter()
            .flat_map(|item| item.constraints.iter().cloned())
            .collect()
    }

    /// Entries for `property`, in original order; empty when none match
    pub fn errors_for_property(&self, property: &str) -> Vec<&ValidationErrorItem> {
        self.validation_errors
            .iter()
            .filter(|item| item.property == property)
            .collect()
    }
}

/// Inventory client errors
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Missing credentials, use before initialization, or double initialization
    #[error("Configuration error: {}", .0.message)]
    Configuration(ErrorDetails),

    /// The request was rejected as malformed
    #[error("Validation failed: {}", .0.details.message)]
    Validation(ValidationFailure),

    /// The server rejected the credentials (401/403)
    #[error("Authentication failed: {}", .0.message)]
    Authentication(ErrorDetails),

    /// Server-side failure or no response at all
    #[error("Network error: {}", .0.message)]
    Network(ErrorDetails),
}

impl InventoryError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(ErrorDetails::new(message))
    }

    /// A value supplied by the caller could not be encoded as JSON
    pub(crate) fn encoding(property: &str, err: serde_json::Error) -> Self {
        let details = ErrorDetails::new(format!("Failed to encode {}: {}", property, err))
            .with_original_error(err.to_string());
        Self::Validation(ValidationFailure::new(
            details,
            vec![ValidationErrorItem::new(property, vec![err.to_string()])],
        ))
    }

    pub fn details(&self) -> &ErrorDetails {
        match self {
            Self::Configuration(details)
            | Self::Authentication(details)
            | Self::Network(details) => details,
            Self::Validation(failure) => &failure.details,
        }
    }

    pub fn message(&self) -> &str {
        &self.details().message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.details().status_code
    }

    pub fn request_id(&self) -> Option<&str> {
        self.details().request_id.as_deref()
    }

    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Validation(failure) => Some(failure),
            _ => None,
        }
    }

    /// Only network failures may succeed on an identical retry.
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure() -> ValidationFailure {
        let items: Vec<ValidationErrorItem> = serde_json::from_value(json!([
            {"property": "brandDetails", "constraints": ["a", "b"], "children": []},
            {"property": "sku", "constraints": ["c"]},
            {"property": "brandDetails", "constraints": ["d"], "children": []}
        ]))
        .unwrap();
        ValidationFailure::new(ErrorDetails::new("Validation failed"), items)
    }

    #[test]
    fn test_all_messages_preserves_order() {
        assert_eq!(failure().all_messages(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_errors_for_property_filters_in_order() {
        let failure = failure();
        let matches = failure.errors_for_property("brandDetails");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].constraints, vec!["a", "b"]);
        assert_eq!(matches[1].constraints, vec!["d"]);
        assert!(failure.errors_for_property("factoryDetails").is_empty());
    }

    #[test]
    fn test_constraints_accept_object_form() {
        let item: ValidationErrorItem = serde_json::from_value(json!({
            "property": "quantity",
            "constraints": {"min": "quantity must not be less than 0", "isInt": "quantity must be an integer"}
        }))
        .unwrap();
        assert_eq!(
            item.constraints,
            vec![
                "quantity must not be less than 0",
                "quantity must be an integer"
            ]
        );
        assert!(item.children.is_empty());
    }

    #[test]
    fn test_constraints_reject_scalar() {
        let result: std::result::Result<ValidationErrorItem, _> =
            serde_json::from_value(json!({"property": "sku", "constraints": 5}));
        assert!(result.is_err());
    }

    #[test]
    fn test_original_error_is_mirrored_into_context() {
        let details = ErrorDetails::new("boom").with_original_error("connection refused");
        assert_eq!(details.original_error.as_deref(), Some("connection refused"));
        assert_eq!(
            details.context.get("originalError"),
            Some(&json!("connection refused"))
        );
    }

    #[test]
    fn test_only_network_errors_are_retryable() {
        assert!(InventoryError::Network(ErrorDetails::new("down")).is_retryable());
        assert!(!InventoryError::Authentication(ErrorDetails::new("no")).is_retryable());
        assert!(!InventoryError::configuration("missing").is_retryable());
        assert!(!InventoryError::Validation(failure()).is_retryable());
    }

    #[test]
    fn test_display_includes_message() {
        let err = InventoryError::Authentication(
            ErrorDetails::new("Invalid API credentials").with_status(401),
        );
        assert!(err.to_string().contains("Invalid API credentials"));
        assert_eq!(err.status_code(), Some(401));
    }
}
