//! Destination records and the graph that owns them.
//!
//! Records live in a [`RecordGraph`] arena and refer to each other through
//! [`RecordId`]s. A relationship edge is a reference: inserting a record into
//! another record's edge never transfers ownership.

use crate::values::AttributeValue;
use std::collections::BTreeMap;
use std::fmt;

/// Handle of a record inside a [`RecordGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A relationship edge on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edge {
    /// To-one edge; `None` once unset with [`Record::unset_edge`].
    ToOne(Option<RecordId>),
    /// To-many edge, in insertion order, without duplicates.
    ToMany(Vec<RecordId>),
}

/// A typed destination object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entity: String,
    attributes: BTreeMap<String, AttributeValue>,
    relationships: BTreeMap<String, Edge>,
}

impl Record {
    /// Create an empty record of the given entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Default::default()
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Get an attribute value.
    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    /// Whether the attribute currently holds a value.
    pub fn contains(&self, attribute: &str) -> bool {
        self.attributes.contains_key(attribute)
    }

    /// Set an attribute value, returning the previous one.
    pub fn set(
        &mut self,
        attribute: impl Into<String>,
        value: AttributeValue,
    ) -> Option<AttributeValue> {
        self.attributes.insert(attribute.into(), value)
    }

    /// Remove an attribute value, returning it.
    pub fn clear(&mut self, attribute: &str) -> Option<AttributeValue> {
        self.attributes.remove(attribute)
    }

    /// Attribute values in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Relationship edges in name order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &Edge)> {
        self.relationships.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn edge(&self, relationship: &str) -> Option<&Edge> {
        self.relationships.get(relationship)
    }

    /// Target of a to-one edge.
    pub fn to_one(&self, relationship: &str) -> Option<RecordId> {
        match self.relationships.get(relationship) {
            Some(Edge::ToOne(target)) => *target,
            _ => None,
        }
    }

    /// Targets of a to-many edge; empty when the edge is unset.
    pub fn to_many(&self, relationship: &str) -> &[RecordId] {
        match self.relationships.get(relationship) {
            Some(Edge::ToMany(targets)) => targets,
            _ => &[],
        }
    }

    /// Point a to-one edge at `target`, returning the previous target.
    pub fn set_to_one(
        &mut self,
        relationship: impl Into<String>,
        target: RecordId,
    ) -> Option<RecordId> {
        match self
            .relationships
            .insert(relationship.into(), Edge::ToOne(Some(target)))
        {
            Some(Edge::ToOne(previous)) => previous,
            _ => None,
        }
    }

    /// Add `target` to a to-many edge.
    ///
    /// Returns `false` when the target was already present.
    pub fn insert_to_many(&mut self, relationship: impl Into<String>, target: RecordId) -> bool {
        let edge = self
            .relationships
            .entry(relationship.into())
            .or_insert_with(|| Edge::ToMany(Vec::new()));

        match edge {
            Edge::ToMany(targets) => {
                if targets.contains(&target) {
                    false
                } else {
                    targets.push(target);
                    true
                }
            }
            Edge::ToOne(_) => {
                *edge = Edge::ToMany(vec![target]);
                true
            }
        }
    }

    /// Remove `target` from a to-many edge. Returns whether it was present.
    pub fn remove_from_many(&mut self, relationship: &str, target: RecordId) -> bool {
        match self.relationships.get_mut(relationship) {
            Some(Edge::ToMany(targets)) => {
                let before = targets.len();
                targets.retain(|t| *t != target);
                targets.len() != before
            }
            _ => false,
        }
    }

    /// Unset an edge of either cardinality, returning what it held.
    ///
    /// A to-one edge stays on the record as `ToOne(None)`; a to-many edge is
    /// removed.
    pub fn unset_edge(&mut self, relationship: &str) -> Option<Edge> {
        if let Some(Edge::ToOne(target)) = self.relationships.get_mut(relationship) {
            return Some(Edge::ToOne(target.take()));
        }
        self.relationships.remove(relationship)
    }
}

/// Arena owning every record built during marshaling.
#[derive(Debug, Clone, Default)]
pub struct RecordGraph {
    records: Vec<Record>,
}

impl RecordGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the graph, returning its handle.
    pub fn insert(&mut self, record: Record) -> RecordId {
        let id = RecordId(self.records.len());
        self.records.push(record);
        id
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.0)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.records.get_mut(id.0)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        id.0 < self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.records
            .iter()
            .enumerate()
            .map(|(idx, record)| (RecordId(idx), record))
    }

    /// Records of one entity, in insertion order.
    pub fn records_of<'a>(
        &'a self,
        entity: &'a str,
    ) -> impl Iterator<Item = (RecordId, &'a Record)> + 'a {
        self.iter().filter(move |(_, r)| r.entity() == entity)
    }
}
