//! Coercion of raw document values into typed attribute values.
//!
//! [`ValueCoercer`] converts one raw value at a time according to the
//! attribute's [`SemanticType`]. It never touches a record: the caller decides
//! what to do with the result, including with failures.
//!
//! ## Conversion rules
//!
//! | Type | Accepted input |
//! |------|----------------|
//! | `string` | strings; numbers and booleans rendered as text |
//! | `integer16/32/64` | integral numbers, zero-fraction floats, numeric strings, booleans as 1/0 |
//! | `float` / `double` | numbers, numeric strings, booleans as 1/0 |
//! | `decimal` | numbers and numeric strings, scientific notation included |
//! | `boolean` | booleans, numbers (`!= 0`), `true/false/yes/no/y/n/t/f/1/0` |
//! | `date` | strings in the configured [`DateFormat`], numbers as epoch values |
//! | `binary` | base64 strings, sequences of byte values |
//! | `transformable` | anything, handed to the named transformer |
//!
//! A raw `null` coerces to "no value" for every type.

use crate::date::{from_epoch, parse_date_str, DateFormat};
use crate::error::{json_kind, CoercionError, Result};
use crate::transform::TransformerRegistry;
use base64::Engine;
use chrono_tz::Tz;
use marshal_core::{AttributeDescriptor, AttributeValue, SemanticType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::str::FromStr;
use std::sync::Arc;

/// How malformed values are reported.
///
/// In both modes a malformed value leaves the field untouched. Strict mode
/// reports it as an error instead of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionMode {
    #[default]
    Lenient,
    Strict,
}

/// Settings shared by every coercion.
///
/// # Example
///
/// ```rust
/// use marshal_json::{CoercionConfig, CoercionMode, DateFormat};
///
/// let config = CoercionConfig::new()
///     .with_date_format(DateFormat::pattern("dd/MM/yyyy"))
///     .with_time_zone(chrono_tz::Europe::Berlin)
///     .strict();
/// assert_eq!(config.mode, CoercionMode::Strict);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionConfig {
    /// Format used for date strings and epoch numbers.
    pub date_format: DateFormat,

    /// Zone used for date strings that carry no offset.
    pub time_zone: Tz,

    pub mode: CoercionMode,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            date_format: DateFormat::default(),
            time_zone: Tz::UTC,
            mode: CoercionMode::default(),
        }
    }
}

impl CoercionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_format(mut self, date_format: DateFormat) -> Self {
        self.date_format = date_format;
        self
    }

    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    pub fn with_mode(mut self, mode: CoercionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `with_mode(CoercionMode::Strict)`.
    pub fn strict(self) -> Self {
        self.with_mode(CoercionMode::Strict)
    }
}

/// Converts raw document values into [`AttributeValue`]s.
#[derive(Debug, Clone)]
pub struct ValueCoercer {
    config: CoercionConfig,
    transformers: Arc<TransformerRegistry>,
}

impl Default for ValueCoercer {
    fn default() -> Self {
        Self::new(CoercionConfig::default())
    }
}

impl ValueCoercer {
    /// Create a coercer with the built-in transformers.
    pub fn new(config: CoercionConfig) -> Self {
        Self {
            config,
            transformers: Arc::new(TransformerRegistry::with_builtins()),
        }
    }

    /// Replace the transformer registry.
    pub fn with_transformers(mut self, transformers: TransformerRegistry) -> Self {
        self.transformers = Arc::new(transformers);
        self
    }

    pub fn config(&self) -> &CoercionConfig {
        &self.config
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    /// Coerce `raw` for the given attribute.
    ///
    /// Returns `Ok(None)` when `raw` is `null`.
    pub fn coerce(
        &self,
        raw: &Value,
        attribute: &AttributeDescriptor,
    ) -> Result<Option<AttributeValue>> {
        self.coerce_as(raw, &attribute.semantic_type)
    }

    /// Coerce `raw` to `semantic_type`.
    pub fn coerce_as(
        &self,
        raw: &Value,
        semantic_type: &SemanticType,
    ) -> Result<Option<AttributeValue>> {
        if raw.is_null() {
            return Ok(None);
        }

        let value = match semantic_type {
            SemanticType::String => coerce_string(raw)?,
            SemanticType::Integer16 => {
                coerce_integer(raw, i16::MIN.into(), i16::MAX.into(), "integer16")?
            }
            SemanticType::Integer32 => {
                coerce_integer(raw, i32::MIN.into(), i32::MAX.into(), "integer32")?
            }
            SemanticType::Integer64 => coerce_integer(raw, i64::MIN, i64::MAX, "integer64")?,
            SemanticType::Float => {
                let f = coerce_f64(raw)?;
                if f.abs() > f32::MAX as f64 {
                    return Err(CoercionError::NumericOverflow {
                        value: f.to_string(),
                        target_type: "float",
                    });
                }
                AttributeValue::Float(f)
            }
            SemanticType::Double => AttributeValue::Float(coerce_f64(raw)?),
            SemanticType::Decimal => AttributeValue::Decimal(coerce_decimal(raw)?),
            SemanticType::Boolean => AttributeValue::Boolean(coerce_bool(raw)?),
            SemanticType::Date => self.coerce_date(raw)?,
            SemanticType::Binary => AttributeValue::Binary(coerce_binary(raw)?),
            SemanticType::Transformable { transformer } => {
                self.coerce_transformable(raw, transformer.as_deref())?
            }
        };

        Ok(Some(value))
    }

    fn coerce_date(&self, raw: &Value) -> Result<AttributeValue> {
        let instant = match raw {
            Value::String(s) => {
                parse_date_str(s, &self.config.date_format, &self.config.time_zone)?
            }
            Value::Number(n) => {
                let number = n.as_f64().ok_or_else(|| CoercionError::InvalidNumber {
                    value: n.to_string(),
                })?;
                from_epoch(number, &self.config.date_format)?
            }
            other => {
                return Err(CoercionError::TypeMismatch {
                    expected: "date",
                    actual: json_kind(other),
                })
            }
        };
        Ok(AttributeValue::Date(instant))
    }

    fn coerce_transformable(&self, raw: &Value, name: Option<&str>) -> Result<AttributeValue> {
        let Some(name) = name else {
            return Ok(AttributeValue::Opaque(raw.clone()));
        };
        let transformer =
            self.transformers
                .get(name)
                .ok_or_else(|| CoercionError::UnknownTransformer {
                    name: name.to_string(),
                })?;

        tracing::trace!("Applying transformer '{name}'");
        transformer(raw).map_err(|reason| CoercionError::Transform {
            name: name.to_string(),
            reason,
        })
    }
}

fn coerce_string(raw: &Value) -> Result<AttributeValue> {
    match raw {
        Value::String(s) => Ok(AttributeValue::String(s.clone())),
        Value::Number(n) => Ok(AttributeValue::String(n.to_string())),
        Value::Bool(b) => Ok(AttributeValue::String(b.to_string())),
        other => Err(CoercionError::TypeMismatch {
            expected: "string",
            actual: json_kind(other),
        }),
    }
}

fn coerce_integer(
    raw: &Value,
    min: i64,
    max: i64,
    target_type: &'static str,
) -> Result<AttributeValue> {
    let value = match raw {
        Value::Number(n) => integer_from_number(n, target_type)?,
        Value::String(s) => integer_from_str(s, target_type)?,
        Value::Bool(b) => i64::from(*b),
        other => {
            return Err(CoercionError::TypeMismatch {
                expected: target_type,
                actual: json_kind(other),
            })
        }
    };

    if value < min || value > max {
        return Err(CoercionError::NumericOverflow {
            value: value.to_string(),
            target_type,
        });
    }
    Ok(AttributeValue::Integer(value))
}

fn integer_from_number(n: &Number, target_type: &'static str) -> Result<i64> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        return Err(CoercionError::NumericOverflow {
            value: n.to_string(),
            target_type,
        });
    }
    match n.as_f64() {
        Some(f) => integer_from_f64(f, target_type),
        None => Err(CoercionError::InvalidNumber {
            value: n.to_string(),
        }),
    }
}

fn integer_from_str(s: &str, target_type: &'static str) -> Result<i64> {
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(i);
    }
    if trimmed.parse::<i128>().is_ok() {
        return Err(CoercionError::NumericOverflow {
            value: trimmed.to_string(),
            target_type,
        });
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => integer_from_f64(f, target_type),
        _ => Err(CoercionError::InvalidNumber {
            value: s.to_string(),
        }),
    }
}

fn integer_from_f64(f: f64, target_type: &'static str) -> Result<i64> {
    if f.fract() != 0.0 {
        return Err(CoercionError::NonIntegral {
            value: f.to_string(),
        });
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(CoercionError::NumericOverflow {
            value: f.to_string(),
            target_type,
        });
    }
    Ok(f as i64)
}

fn coerce_f64(raw: &Value) -> Result<f64> {
    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| CoercionError::InvalidNumber {
            value: n.to_string(),
        }),
        // "NaN", "inf" and overflowing literals parse as f64 but are not numbers.
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(f),
            _ => Err(CoercionError::InvalidNumber { value: s.clone() }),
        },
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(CoercionError::TypeMismatch {
            expected: "number",
            actual: json_kind(other),
        }),
    }
}

fn coerce_decimal(raw: &Value) -> Result<Decimal> {
    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(CoercionError::TypeMismatch {
                expected: "decimal",
                actual: json_kind(other),
            })
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| CoercionError::InvalidNumber { value: text })
}

fn coerce_bool(raw: &Value) -> Result<bool> {
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => Ok(f != 0.0),
            None => Err(CoercionError::InvalidNumber {
                value: n.to_string(),
            }),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "t" | "1" => Ok(true),
            "false" | "no" | "n" | "f" | "0" => Ok(false),
            _ => Err(CoercionError::InvalidBoolean { value: s.clone() }),
        },
        other => Err(CoercionError::TypeMismatch {
            expected: "boolean",
            actual: json_kind(other),
        }),
    }
}

fn coerce_binary(raw: &Value) -> Result<Vec<u8>> {
    match raw {
        Value::String(s) => base64::engine::general_purpose::STANDARD
            .decode(s.trim())
            .map_err(|e| CoercionError::InvalidBase64 {
                reason: e.to_string(),
            }),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_u64() {
                Some(byte) if byte <= u8::MAX as u64 => Ok(byte as u8),
                Some(_) => Err(CoercionError::NumericOverflow {
                    value: item.to_string(),
                    target_type: "byte",
                }),
                None => Err(CoercionError::TypeMismatch {
                    expected: "byte",
                    actual: json_kind(item),
                }),
            })
            .collect(),
        other => Err(CoercionError::TypeMismatch {
            expected: "binary",
            actual: json_kind(other),
        }),
    }
}
