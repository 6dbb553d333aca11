//! Error types for value coercion.
//!
//! A coercion error is always local to one attribute: callers record it and
//! carry on with the remaining attributes.

use thiserror::Error;

/// Errors that can occur while coercing a raw document value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// The raw value has a shape the target type cannot accept.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A string that should hold a number does not parse as one.
    #[error("Invalid number: {value}")]
    InvalidNumber { value: String },

    /// A number outside the range of the target type.
    #[error("Numeric overflow converting {value} to {target_type}")]
    NumericOverflow {
        value: String,
        target_type: &'static str,
    },

    /// A number with a fractional part where an integer is required.
    #[error("Expected an integral value, got {value}")]
    NonIntegral { value: String },

    /// A string that is not a recognized boolean token.
    #[error("Invalid boolean: {value}")]
    InvalidBoolean { value: String },

    /// A date that does not match the configured format.
    #[error("Invalid date: {value}. Expected format {format}")]
    InvalidDate { value: String, format: String },

    /// A local date-time that is ambiguous or skipped in the configured zone.
    #[error("Ambiguous or invalid datetime in timezone {timezone}: {datetime}")]
    AmbiguousDateTime { timezone: String, datetime: String },

    /// A string that is not valid base64.
    #[error("Invalid base64 data: {reason}")]
    InvalidBase64 { reason: String },

    /// A transformable attribute names a transformer nobody registered.
    #[error("No transformer registered under '{name}'")]
    UnknownTransformer { name: String },

    /// A transformer rejected the raw value.
    #[error("Transformer '{name}' failed: {reason}")]
    Transform { name: String, reason: String },
}

/// Result type for coercions.
pub type Result<T> = std::result::Result<T, CoercionError>;

/// Name of the JSON shape of `value`, for diagnostics.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}
