//! Record population for record-marshal.
//!
//! This crate holds the two passes run over every proto-record:
//!
//! 1. [`Marshaler::populate_attributes`] resolves each attribute among its
//!    candidate key paths, coerces the raw value and stores it.
//! 2. [`Marshaler::establish_relationships`] wires the relationship edges to
//!    the targets registered on the proto-record, delegating the primary-key
//!    relationship to [`Marshaler::bind_primary_key_relationship`].
//!
//! Deciding which records to build, in which order, and which targets to
//! register is left to the caller (the driver).
//!
//! # Error handling
//!
//! Malformed or missing source data never aborts a pass. It is collected as
//! [`Diagnostic`]s in the returned [`PopulationReport`]. Only broken
//! sequencing (binding to an unidentified parent) and driver defects are
//! returned as [`MarshalError`]s.
//!
//! # Strategies
//!
//! Key-path selection, value setting and edge wiring are pluggable through
//! [`KeyPathPolicy`], [`ValueSetter`] and [`EdgeEstablisher`], configured on
//! [`MarshalerBuilder`].

mod diagnostic;
mod error;
mod establish;
mod marshaler;
mod populate;
mod proto;
mod strategy;

pub use diagnostic::{Diagnostic, DiagnosticKind, PopulationReport, Severity};
pub use error::{MarshalError, Result};
pub use marshaler::{Marshaler, MarshalerBuilder};
pub use proto::{ProtoRecord, TargetRef};
pub use strategy::{
    CoercingSetter, DirectEdges, EdgeEstablisher, EdgeOutcome, FirstPresent, KeyPathPolicy,
    SetOutcome, ValueSetter,
};
