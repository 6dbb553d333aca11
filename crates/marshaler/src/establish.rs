//! Relationship establishment and primary-key binding.

use crate::diagnostic::{Diagnostic, DiagnosticKind, PopulationReport, Severity};
use crate::error::{MarshalError, Result};
use crate::marshaler::{record_mut, Marshaler};
use crate::proto::{ProtoRecord, TargetRef};
use crate::strategy::EdgeOutcome;
use marshal_core::{Cardinality, RecordGraph, RelationshipDescriptor};
use std::sync::Arc;
use tracing::{debug, warn};

impl Marshaler {
    /// Wire every relationship of the proto-record to the targets registered
    /// on it, in declaration order.
    ///
    /// The primary-key relationship is bound to the last parent registered
    /// under its name (see [`Marshaler::bind_primary_key_relationship`]);
    /// more than one parent is reported like any other to-one relationship.
    /// Other relationships go through the edge establisher: a to-one edge is
    /// assigned once per target so the last one wins, a to-many edge receives
    /// each target once. Relationships without targets are left untouched.
    ///
    /// A target that is missing from the graph, or that is not an instance of
    /// the destination entity, is skipped with a diagnostic. Binding a child to
    /// a parent whose primary key is unresolved is an error.
    pub fn establish_relationships(
        &self,
        graph: &mut RecordGraph,
        proto: &mut ProtoRecord,
    ) -> Result<PopulationReport> {
        record_mut(graph, proto)?;
        let schema = Arc::clone(proto.schema());
        let mut report = PopulationReport::new();

        for relationship in &schema.relationships {
            let targets = proto.targets(&relationship.name).to_vec();
            let Some(last) = targets.last() else {
                continue;
            };

            let to_one = relationship.primary_key || relationship.cardinality == Cardinality::ToOne;
            if to_one && targets.len() > 1 {
                warn!(
                    "{}.{}: {} targets for a to-one relationship, keeping the last",
                    proto.entity(),
                    relationship.name,
                    targets.len()
                );
                report.push(Diagnostic::new(
                    proto.entity(),
                    relationship.name.as_str(),
                    Severity::Warning,
                    DiagnosticKind::MultipleToOneTargets {
                        count: targets.len(),
                    },
                ));
            }

            if relationship.primary_key {
                self.bind_to_parent(graph, proto, relationship, last)?;
                report.edges_assigned += 1;
                continue;
            }

            for target in &targets {
                if let Some(kind) = check_target(graph, relationship, target) {
                    warn!("{}.{}: {kind}", proto.entity(), relationship.name);
                    report.push(Diagnostic::new(
                        proto.entity(),
                        relationship.name.as_str(),
                        Severity::Warning,
                        kind,
                    ));
                    continue;
                }

                let record = record_mut(graph, proto)?;
                let outcome = self.edges.establish(record, relationship, target.record);
                debug!(
                    "{}.{} -> {}: {outcome:?}",
                    proto.entity(),
                    relationship.name,
                    target.record
                );
                match outcome {
                    EdgeOutcome::Assigned { .. } => report.edges_assigned += 1,
                    EdgeOutcome::Inserted => report.edges_inserted += 1,
                    EdgeOutcome::Duplicate => report.duplicates_suppressed += 1,
                    EdgeOutcome::Skipped => {}
                }
            }
        }

        Ok(report)
    }

    /// Bind the proto-record's primary-key relationship to `parent`.
    ///
    /// The parent must already be identified: its primary key is the link.
    /// When the child has no identity of its own it takes the parent's.
    ///
    /// Fails when the parent's primary key is unresolved, when the entity has
    /// no primary-key relationship, when the parent's record is not in the
    /// graph, or when the parent is not an instance of the relationship's
    /// destination.
    pub fn bind_primary_key_relationship(
        &self,
        graph: &mut RecordGraph,
        proto: &mut ProtoRecord,
        parent: &ProtoRecord,
    ) -> Result<()> {
        let schema = Arc::clone(proto.schema());
        let relationship =
            schema
                .primary_key_relationship()
                .ok_or_else(|| MarshalError::MissingPrimaryKeyRelationship {
                    entity: proto.entity().to_string(),
                })?;

        self.bind_to_parent(graph, proto, relationship, &parent.as_target())
    }

    fn bind_to_parent(
        &self,
        graph: &mut RecordGraph,
        proto: &mut ProtoRecord,
        relationship: &RelationshipDescriptor,
        parent: &TargetRef,
    ) -> Result<()> {
        let Some(primary_key) = parent.primary_key.clone() else {
            return Err(MarshalError::UnresolvedParentIdentity {
                entity: proto.entity().to_string(),
                relationship: relationship.name.clone(),
            });
        };

        let parent_entity = graph
            .get(parent.record)
            .ok_or(MarshalError::UnknownRecord {
                record: parent.record,
            })?
            .entity();
        if parent_entity != relationship.destination {
            return Err(MarshalError::ParentMismatch {
                entity: proto.entity().to_string(),
                relationship: relationship.name.clone(),
                expected: relationship.destination.clone(),
                actual: parent_entity.to_string(),
            });
        }

        let record = record_mut(graph, proto)?;
        self.edges.establish(record, relationship, parent.record);
        debug!(
            "{}.{}: bound to parent {} ({primary_key})",
            proto.entity(),
            relationship.name,
            parent.record
        );

        if proto.primary_key().is_none() {
            proto.set_primary_key(primary_key);
        }
        Ok(())
    }
}

/// Why a target cannot be wired, if it cannot.
fn check_target(
    graph: &RecordGraph,
    relationship: &RelationshipDescriptor,
    target: &TargetRef,
) -> Option<DiagnosticKind> {
    match graph.get(target.record) {
        None => Some(DiagnosticKind::UnresolvedTarget {
            target: target.record,
        }),
        Some(record) if record.entity() != relationship.destination => {
            Some(DiagnosticKind::DestinationMismatch {
                target: target.record,
                expected: relationship.destination.clone(),
                actual: record.entity().to_string(),
            })
        }
        Some(_) => None,
    }
}
