//! Error types for record marshaling.
//!
//! These are hard failures: a broken driver invariant or a parent-before-child
//! ordering violation. Malformed source data is reported through
//! [`Diagnostic`](crate::Diagnostic)s instead.

use marshal_core::RecordId;
use thiserror::Error;

/// Errors that abort a population or establishment pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarshalError {
    /// The proto-record points at a record that is not in the graph
    #[error("Record {record} is not in the graph")]
    UnknownRecord { record: RecordId },

    /// The proto-record's record belongs to another entity than its schema
    #[error("Record {record} is a '{actual}', but its schema describes '{expected}'")]
    EntityMismatch {
        record: RecordId,
        expected: String,
        actual: String,
    },

    /// Primary-key binding was attempted before the parent was identified
    #[error("Cannot bind '{entity}.{relationship}': the parent's primary key is unresolved")]
    UnresolvedParentIdentity {
        entity: String,
        relationship: String,
    },

    /// Primary-key binding on an entity without a primary-key relationship
    #[error("Entity '{entity}' declares no primary-key relationship")]
    MissingPrimaryKeyRelationship { entity: String },

    /// The parent is not an instance of the relationship's destination
    #[error("Cannot bind '{entity}.{relationship}': expected a '{expected}' parent, got '{actual}'")]
    ParentMismatch {
        entity: String,
        relationship: String,
        expected: String,
        actual: String,
    },
}

/// Result type for marshaling passes.
pub type Result<T> = std::result::Result<T, MarshalError>;
