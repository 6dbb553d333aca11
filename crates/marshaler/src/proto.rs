//! Proto-records: the staging state of one record during a pass.

use marshal_core::{EntitySchema, PrimaryKey, Record, RecordGraph, RecordId};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A reference to an already-materialized record on the far end of a
/// relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRef {
    pub record: RecordId,
    /// Identity of the target, when known.
    pub primary_key: Option<PrimaryKey>,
}

impl TargetRef {
    pub fn new(record: RecordId, primary_key: Option<PrimaryKey>) -> Self {
        Self {
            record,
            primary_key,
        }
    }
}

/// Pairs a destination record with its schema, its source sub-document, its
/// identity and the targets registered for its relationships.
///
/// The driver builds proto-records and registers targets on them; the
/// [`Marshaler`](crate::Marshaler) reads them.
#[derive(Debug, Clone)]
pub struct ProtoRecord {
    record: RecordId,
    schema: Arc<EntitySchema>,
    document: Value,
    primary_key: Option<PrimaryKey>,
    targets: BTreeMap<String, Vec<TargetRef>>,
}

impl ProtoRecord {
    /// Stage an existing record.
    pub fn new(record: RecordId, schema: Arc<EntitySchema>, document: Value) -> Self {
        Self {
            record,
            schema,
            document,
            primary_key: None,
            targets: BTreeMap::new(),
        }
    }

    /// Insert a fresh record of the schema's entity and stage it.
    pub fn create(graph: &mut RecordGraph, schema: Arc<EntitySchema>, document: Value) -> Self {
        let record = graph.insert(Record::new(schema.name.as_str()));
        Self::new(record, schema, document)
    }

    pub fn record(&self) -> RecordId {
        self.record
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    pub fn entity(&self) -> &str {
        &self.schema.name
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    pub fn set_primary_key(&mut self, primary_key: PrimaryKey) {
        self.primary_key = Some(primary_key);
    }

    /// This record as a relationship target of another record.
    pub fn as_target(&self) -> TargetRef {
        TargetRef::new(self.record, self.primary_key.clone())
    }

    /// Register a target for a relationship, after the ones already there.
    pub fn add_target(&mut self, relationship: impl Into<String>, target: TargetRef) {
        self.targets
            .entry(relationship.into())
            .or_default()
            .push(target);
    }

    /// Targets registered for a relationship, in registration order.
    pub fn targets(&self, relationship: &str) -> &[TargetRef] {
        self.targets
            .get(relationship)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Read the identity from the record's primary-key attribute.
    ///
    /// Keeps the current identity when the attribute is unset or holds a
    /// value that cannot identify a record.
    pub fn resolve_primary_key(&mut self, graph: &RecordGraph) -> Option<&PrimaryKey> {
        let resolved = self.schema.primary_key.as_deref().and_then(|attribute| {
            graph
                .get(self.record)
                .and_then(|record| record.get(attribute))
                .and_then(PrimaryKey::from_value)
        });
        if let Some(primary_key) = resolved {
            self.primary_key = Some(primary_key);
        }
        self.primary_key.as_ref()
    }
}
