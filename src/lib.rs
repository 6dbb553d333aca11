//! record-marshal
//!
//! Populates typed, connected in-memory records from loosely structured JSON
//! documents, following a schema of entities, attributes and relationships.
//!
//! # Crates
//!
//! - `marshal_core` - Schema, value, record and graph types
//! - `marshal_json` - Key-path resolution, coercion and rendering of JSON values
//! - `record_marshaler` - Attribute population and relationship establishment
//!
//! This crate adds a [`driver::DocumentDriver`] that walks whole documents,
//! the [`config`] layer and the `record-marshal` command-line tool.
//!
//! # CLI Usage
//!
//! ```bash
//! # One JSON line per root record on stdout
//! record-marshal --schema schema.yaml --entity Article --input articles.json
//!
//! # Dates as day/month/year in Berlin time, failing on malformed values
//! record-marshal --schema schema.yaml --entity Article --input articles.json \
//!   --date-format "dd/MM/yyyy" --time-zone Europe/Berlin --strict
//! ```

pub mod config;
pub mod driver;

pub use marshal_core;
pub use marshal_json;
pub use record_marshaler;

pub use config::{MarshalConfig, MarshalOpts};
pub use driver::DocumentDriver;
