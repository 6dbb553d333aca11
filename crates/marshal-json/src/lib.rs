//! JSON document handling for record-marshal.
//!
//! This crate reads raw values out of `serde_json` documents and coerces them
//! into marshal-core's typed [`AttributeValue`](marshal_core::AttributeValue)s.
//!
//! # Modules
//!
//! - [`resolve`] - Key-path lookup with present / null / absent outcomes
//! - [`coerce`] - Raw value → typed attribute value
//! - [`date`] - Date formats, LDML patterns, time zones
//! - [`transform`] - Named transformers for `transformable` attributes
//! - [`forward`] - Records → JSON value, for output
//!
//! # Example
//!
//! ```rust
//! use marshal_core::{KeyPath, SemanticType};
//! use marshal_json::{resolve_first, CoercionConfig, ValueCoercer};
//!
//! let document = serde_json::json!({"stats": {"views": "42"}});
//! let candidates = vec![KeyPath::parse("views"), KeyPath::parse("stats.views")];
//!
//! let raw = resolve_first(&candidates, &document).value().unwrap();
//! let coercer = ValueCoercer::new(CoercionConfig::default());
//! let value = coercer.coerce_as(raw, &SemanticType::Integer32).unwrap();
//! assert_eq!(value.and_then(|v| v.as_i64()), Some(42));
//! ```

pub mod coerce;
pub mod date;
pub mod error;
pub mod forward;
pub mod resolve;
pub mod transform;

pub use coerce::{CoercionConfig, CoercionMode, ValueCoercer};
pub use date::{parse_date_str, translate_ldml, DateFormat};
pub use error::CoercionError;
pub use forward::{attribute_value_to_json, record_to_json, render_record, JsonValue};
pub use resolve::{lookup, resolve_first, Resolution};
pub use transform::{Transformer, TransformerRegistry};
