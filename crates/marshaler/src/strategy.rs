//! Injectable strategies used by [`Marshaler`](crate::Marshaler).
//!
//! Each trait has one default implementation. Callers that need different
//! behaviour (a different fallback rule, extra validation before a value is
//! stored, custom edge bookkeeping) implement the trait and pass it to
//! [`MarshalerBuilder`](crate::MarshalerBuilder).

use marshal_core::{
    AttributeDescriptor, Cardinality, KeyPath, Record, RecordId, RelationshipDescriptor,
};
use marshal_json::{resolve_first, CoercionError, Resolution, ValueCoercer};
use serde_json::Value;

/// Chooses the raw value for an attribute among its candidate key paths.
pub trait KeyPathPolicy: Send + Sync {
    fn resolve<'a>(&self, candidates: &'a [KeyPath], document: &'a Value) -> Resolution<'a>;
}

/// Default policy: the first candidate that exists wins, `null` included.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPresent;

impl KeyPathPolicy for FirstPresent {
    fn resolve<'a>(&self, candidates: &'a [KeyPath], document: &'a Value) -> Resolution<'a> {
        resolve_first(candidates, document)
    }
}

/// What a [`ValueSetter`] did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// A value was stored; `replaced` tells whether one was there before.
    Set { replaced: bool },
    /// The field was cleared.
    Cleared,
    /// Nothing changed.
    Unchanged,
}

/// Coerces a raw value and applies it to a record field.
///
/// On error the record must be left untouched.
pub trait ValueSetter: Send + Sync {
    fn set_value(
        &self,
        record: &mut Record,
        attribute: &AttributeDescriptor,
        raw: &Value,
        coercer: &ValueCoercer,
    ) -> Result<SetOutcome, CoercionError>;
}

/// Default setter: coerce, then store. A raw `null` clears the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoercingSetter;

impl ValueSetter for CoercingSetter {
    fn set_value(
        &self,
        record: &mut Record,
        attribute: &AttributeDescriptor,
        raw: &Value,
        coercer: &ValueCoercer,
    ) -> Result<SetOutcome, CoercionError> {
        match coercer.coerce(raw, attribute)? {
            Some(value) => {
                let previous = record.set(attribute.name.as_str(), value);
                Ok(SetOutcome::Set {
                    replaced: previous.is_some(),
                })
            }
            None if record.clear(&attribute.name).is_some() => Ok(SetOutcome::Cleared),
            None => Ok(SetOutcome::Unchanged),
        }
    }
}

/// What an [`EdgeEstablisher`] did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// A to-one edge now points at the target.
    Assigned { replaced: Option<RecordId> },
    /// The target was added to a to-many edge.
    Inserted,
    /// The target was already in the to-many edge.
    Duplicate,
    /// The establisher chose not to wire the target.
    Skipped,
}

/// Wires one target into a relationship edge of a record.
pub trait EdgeEstablisher: Send + Sync {
    fn establish(
        &self,
        record: &mut Record,
        relationship: &RelationshipDescriptor,
        target: RecordId,
    ) -> EdgeOutcome;
}

/// Default establisher: to-one edges are assigned, to-many edges receive the
/// target once.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectEdges;

impl EdgeEstablisher for DirectEdges {
    fn establish(
        &self,
        record: &mut Record,
        relationship: &RelationshipDescriptor,
        target: RecordId,
    ) -> EdgeOutcome {
        match relationship.cardinality {
            Cardinality::ToOne => EdgeOutcome::Assigned {
                replaced: record.set_to_one(relationship.name.as_str(), target),
            },
            Cardinality::ToMany => {
                if record.insert_to_many(relationship.name.as_str(), target) {
                    EdgeOutcome::Inserted
                } else {
                    EdgeOutcome::Duplicate
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marshal_core::{AttributeValue, RecordGraph, SemanticType};
    use serde_json::json;

    #[test]
    fn test_coercing_setter() {
        let coercer = ValueCoercer::default();
        let attribute = AttributeDescriptor::new("views", SemanticType::Integer32);
        let mut record = Record::new("Article");

        let outcome = CoercingSetter
            .set_value(&mut record, &attribute, &json!("42"), &coercer)
            .unwrap();
        assert_eq!(outcome, SetOutcome::Set { replaced: false });
        assert_eq!(record.get("views"), Some(&AttributeValue::Integer(42)));

        let outcome = CoercingSetter
            .set_value(&mut record, &attribute, &json!(43), &coercer)
            .unwrap();
        assert_eq!(outcome, SetOutcome::Set { replaced: true });
    }

    /// A failed coercion leaves the previous value in place.
    #[test]
    fn test_coercing_setter_failure_keeps_value() {
        let coercer = ValueCoercer::default();
        let attribute = AttributeDescriptor::new("views", SemanticType::Integer32);
        let mut record = Record::new("Article");
        record.set("views", AttributeValue::Integer(7));

        let result = CoercingSetter.set_value(&mut record, &attribute, &json!("many"), &coercer);
        assert!(result.is_err());
        assert_eq!(record.get("views"), Some(&AttributeValue::Integer(7)));
    }

    #[test]
    fn test_coercing_setter_null_clears() {
        let coercer = ValueCoercer::default();
        let attribute = AttributeDescriptor::new("title", SemanticType::String);
        let mut record = Record::new("Article");
        record.set("title", AttributeValue::from("Draft"));

        let outcome = CoercingSetter
            .set_value(&mut record, &attribute, &Value::Null, &coercer)
            .unwrap();
        assert_eq!(outcome, SetOutcome::Cleared);
        assert!(!record.contains("title"));

        let outcome = CoercingSetter
            .set_value(&mut record, &attribute, &Value::Null, &coercer)
            .unwrap();
        assert_eq!(outcome, SetOutcome::Unchanged);
    }

    #[test]
    fn test_direct_edges() {
        let mut graph = RecordGraph::new();
        let ada = graph.insert(Record::new("Person"));
        let tag = graph.insert(Record::new("Tag"));
        let author = RelationshipDescriptor::to_one("author", "Person");
        let tags = RelationshipDescriptor::to_many("tags", "Tag");
        let mut record = Record::new("Article");

        assert_eq!(
            DirectEdges.establish(&mut record, &author, ada),
            EdgeOutcome::Assigned { replaced: None }
        );
        assert_eq!(DirectEdges.establish(&mut record, &tags, tag), EdgeOutcome::Inserted);
        assert_eq!(DirectEdges.establish(&mut record, &tags, tag), EdgeOutcome::Duplicate);
        assert_eq!(record.to_many("tags"), [tag]);
    }

    #[test]
    fn test_first_present() {
        let candidates = vec![KeyPath::parse("headline"), KeyPath::parse("name")];
        let document = json!({"name": "Report A"});
        assert_eq!(
            FirstPresent.resolve(&candidates, &document).value(),
            Some(&json!("Report A"))
        );
    }
}
