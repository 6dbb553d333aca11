//! Core types for the record-marshal population engine.
//!
//! This crate provides the foundational types shared by every stage of
//! marshaling:
//!
//! - [`SemanticType`] - Declared destination type of an attribute
//! - [`KeyPath`] - Locator of a raw value inside a nested document
//! - [`EntitySchema`] / [`SchemaRegistry`] - Attribute and relationship descriptors per entity
//! - [`AttributeValue`] - Coerced, typed attribute values
//! - [`Record`] / [`RecordGraph`] - Destination records and the arena owning them
//!
//! # Architecture
//!
//! ```text
//! marshal-core (this crate)
//!    │
//!    ├─── marshal-json       (key-path lookup and coercion over serde_json documents)
//!    │
//!    └─── record-marshaler   (attribute population, relationship establishment)
//! ```
//!
//! # Example
//!
//! ```rust
//! use marshal_core::{AttributeDescriptor, EntitySchema, SchemaRegistry, SemanticType};
//!
//! let registry = SchemaRegistry::new(vec![EntitySchema::new("Article")
//!     .with_attribute(
//!         AttributeDescriptor::new("title", SemanticType::String)
//!             .with_key_paths(["headline", "name"]),
//!     )])
//! .unwrap();
//!
//! let article = registry.entity("Article").unwrap();
//! assert_eq!(article.attributes[0].key_paths.len(), 2);
//! ```

pub mod keypath;
pub mod record;
pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use keypath::KeyPath;
pub use record::{Edge, Record, RecordGraph, RecordId};
pub use schema::{
    AttributeDescriptor, EntitySchema, RelationshipDescriptor, SchemaError, SchemaRegistry,
};
pub use types::{Cardinality, SemanticType};
pub use values::{AttributeValue, PrimaryKey};
