//! A reference driver that marshals whole JSON documents.
//!
//! The [`Marshaler`] only handles one proto-record at a time and leaves
//! traversal to its caller. [`DocumentDriver`] is that caller for nested
//! documents:
//!
//! 1. The record is identified before it is created. A record whose entity and
//!    primary key were already seen is reused, so the same object appearing in
//!    several places of a document becomes one record.
//! 2. Attributes are populated and the primary key is resolved.
//! 3. Relationship values are materialized. A mapping (or a sequence of
//!    mappings) becomes child records of the destination entity, built
//!    recursively with this record as their parent. A scalar is looked up as
//!    a primary key among the records built so far.
//! 4. Relationships are established, binding the primary-key relationship to
//!    the parent.

use anyhow::Context;
use marshal_core::{
    EntitySchema, PrimaryKey, RecordGraph, RecordId, RelationshipDescriptor, SchemaRegistry,
    SemanticType,
};
use marshal_json::{resolve_first, Resolution};
use record_marshaler::{
    Diagnostic, DiagnosticKind, Marshaler, PopulationReport, ProtoRecord, Severity, TargetRef,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds a [`RecordGraph`] out of JSON documents.
#[derive(Debug)]
pub struct DocumentDriver {
    registry: SchemaRegistry,
    marshaler: Marshaler,
    graph: RecordGraph,
    identities: HashMap<(String, PrimaryKey), RecordId>,
    report: PopulationReport,
}

impl DocumentDriver {
    pub fn new(registry: SchemaRegistry, marshaler: Marshaler) -> Self {
        Self {
            registry,
            marshaler,
            graph: RecordGraph::new(),
            identities: HashMap::new(),
            report: PopulationReport::new(),
        }
    }

    pub fn graph(&self) -> &RecordGraph {
        &self.graph
    }

    /// Everything reported by the passes run so far.
    pub fn report(&self) -> &PopulationReport {
        &self.report
    }

    pub fn into_parts(self) -> (RecordGraph, PopulationReport) {
        (self.graph, self.report)
    }

    /// The record of `entity` identified by `primary_key`, if one was built.
    pub fn lookup(&self, entity: &str, primary_key: &PrimaryKey) -> Option<RecordId> {
        self.identities
            .get(&(entity.to_string(), primary_key.clone()))
            .copied()
    }

    /// Marshal one root record of `entity` from a JSON object.
    pub fn marshal(&mut self, entity: &str, document: &Value) -> anyhow::Result<RecordId> {
        let proto = self
            .build(entity, document, None)
            .with_context(|| format!("Failed to marshal '{entity}' record"))?;
        Ok(proto.record())
    }

    /// Marshal a JSON object, or each object of a JSON array, as root records.
    pub fn marshal_all(&mut self, entity: &str, document: &Value) -> anyhow::Result<Vec<RecordId>> {
        let roots = match document {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    self.marshal(entity, item)
                        .with_context(|| format!("Input element {index}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?,
            _ => vec![self.marshal(entity, document)?],
        };

        info!(
            "Marshaled {} root '{entity}' record(s), {} record(s) in total, {} diagnostic(s)",
            roots.len(),
            self.graph.len(),
            self.report.diagnostics.len()
        );
        Ok(roots)
    }

    fn build(
        &mut self,
        entity: &str,
        document: &Value,
        parent: Option<&ProtoRecord>,
    ) -> anyhow::Result<ProtoRecord> {
        let schema = Arc::clone(self.registry.entity(entity)?);
        if !document.is_object() {
            anyhow::bail!("Expected a JSON object for '{entity}', got {document}");
        }

        let mut proto = match self.identify(&schema, document) {
            Some((record, primary_key)) => {
                debug!("Reusing {entity} {record} for primary key {primary_key}");
                let mut proto = ProtoRecord::new(record, Arc::clone(&schema), document.clone());
                proto.set_primary_key(primary_key);
                proto
            }
            None => ProtoRecord::create(&mut self.graph, Arc::clone(&schema), document.clone()),
        };

        let report = self.marshaler.populate_attributes(&mut self.graph, &proto)?;
        self.report.merge(report);
        proto.resolve_primary_key(&self.graph);

        // Registered before descending so children can refer back to it.
        // Keys inherited from a parent are shared by siblings; only own keys identify.
        if schema.primary_key.is_some() {
            if let Some(primary_key) = proto.primary_key() {
                self.identities
                    .entry((entity.to_string(), primary_key.clone()))
                    .or_insert(proto.record());
            }
        }

        for relationship in &schema.relationships {
            if relationship.primary_key {
                if let Some(parent) = parent.filter(|p| p.entity() == relationship.destination) {
                    proto.add_target(relationship.name.as_str(), parent.as_target());
                    continue;
                }
            }
            self.materialize(&mut proto, relationship)
                .with_context(|| format!("Relationship '{entity}.{}'", relationship.name))?;
        }

        let report = self
            .marshaler
            .establish_relationships(&mut self.graph, &mut proto)?;
        self.report.merge(report);
        Ok(proto)
    }

    /// Find an already-built record with the same identity as `document`.
    fn identify(
        &self,
        schema: &EntitySchema,
        document: &Value,
    ) -> Option<(RecordId, PrimaryKey)> {
        let attribute = schema.primary_key_attribute()?;
        let raw = match resolve_first(&attribute.key_paths, document) {
            Resolution::Present { value, .. } => value,
            _ => return None,
        };
        let value = self.marshaler.coercer().coerce(raw, attribute).ok()??;
        let primary_key = PrimaryKey::from_value(&value)?;
        let record = self.lookup(&schema.name, &primary_key)?;
        Some((record, primary_key))
    }

    /// Register the targets found under a relationship's key paths.
    fn materialize(
        &mut self,
        proto: &mut ProtoRecord,
        relationship: &RelationshipDescriptor,
    ) -> anyhow::Result<()> {
        let raw = match resolve_first(&relationship.key_paths, proto.document()) {
            Resolution::Present { value, .. } => value.clone(),
            _ => return Ok(()),
        };

        let items = match raw {
            Value::Array(items) => items,
            other => vec![other],
        };
        for item in &items {
            let target = if item.is_object() {
                Some(
                    self.build(&relationship.destination, item, Some(&*proto))?
                        .as_target(),
                )
            } else if item.is_null() {
                None
            } else {
                self.resolve_reference(proto, relationship, item)?
            };

            if let Some(target) = target {
                proto.add_target(relationship.name.as_str(), target);
            }
        }
        Ok(())
    }

    /// Look a scalar up as the primary key of an already-built record.
    fn resolve_reference(
        &mut self,
        proto: &ProtoRecord,
        relationship: &RelationshipDescriptor,
        raw: &Value,
    ) -> anyhow::Result<Option<TargetRef>> {
        let destination = Arc::clone(self.registry.entity(&relationship.destination)?);
        let value = match destination.primary_key_attribute() {
            Some(attribute) => self.marshaler.coercer().coerce(raw, attribute).ok().flatten(),
            None => self
                .marshaler
                .coercer()
                .coerce_as(raw, &SemanticType::String)
                .ok()
                .flatten(),
        };
        let primary_key = value.as_ref().and_then(PrimaryKey::from_value);

        if let Some(primary_key) = primary_key {
            if let Some(record) = self.lookup(&destination.name, &primary_key) {
                return Ok(Some(TargetRef::new(record, Some(primary_key))));
            }
        }

        warn!(
            "{}.{}: no '{}' record with primary key {raw}",
            proto.entity(),
            relationship.name,
            destination.name
        );
        self.report.push(Diagnostic::new(
            proto.entity(),
            relationship.name.as_str(),
            Severity::Warning,
            DiagnosticKind::UnknownReference {
                destination: destination.name.clone(),
                key: raw.to_string(),
            },
        ));
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marshal_core::AttributeValue;
    use serde_json::json;

    const SCHEMA: &str = r#"
version: 1
entities:
  - name: Person
    primary_key: id
    attributes:
      - name: id
        type: integer64
      - name: name
        type: string
  - name: Article
    primary_key: id
    attributes:
      - name: id
        type: integer64
      - name: title
        type: string
        key_paths: [headline, name]
    relationships:
      - name: author
        cardinality: to_one
        destination: Person
      - name: comments
        cardinality: to_many
        destination: Comment
      - name: related
        cardinality: to_many
        destination: Article
  - name: Comment
    attributes:
      - name: body
        type: string
    relationships:
      - name: article
        cardinality: to_one
        destination: Article
        primary_key: true
"#;

    fn driver() -> DocumentDriver {
        DocumentDriver::new(
            SchemaRegistry::from_yaml(SCHEMA).unwrap(),
            Marshaler::default(),
        )
    }

    #[test]
    fn test_nested_document() {
        let mut driver = driver();
        let root = driver
            .marshal(
                "Article",
                &json!({
                    "id": 1,
                    "name": "Report A",
                    "author": {"id": 10, "name": "Ada"},
                    "comments": [{"body": "first"}, {"body": "second"}]
                }),
            )
            .unwrap();

        let graph = driver.graph();
        let article = graph.get(root).unwrap();
        assert_eq!(article.get("title"), Some(&AttributeValue::from("Report A")));

        let author = article.to_one("author").unwrap();
        assert_eq!(
            graph.get(author).unwrap().get("name"),
            Some(&AttributeValue::from("Ada"))
        );

        let comments = article.to_many("comments");
        assert_eq!(comments.len(), 2);
        for comment in comments {
            assert_eq!(graph.get(*comment).unwrap().to_one("article"), Some(root));
        }
        assert!(driver.report().is_clean());
    }

    /// A record seen twice under the same key is built once.
    #[test]
    fn test_identity_reuse() {
        let mut driver = driver();
        let roots = driver
            .marshal_all(
                "Article",
                &json!([
                    {"id": 1, "author": {"id": 10, "name": "Ada"}},
                    {"id": 2, "author": {"id": 10}},
                    {"id": 3, "author": 10}
                ]),
            )
            .unwrap();

        let graph = driver.graph();
        assert_eq!(graph.records_of("Person").count(), 1);
        let authors: Vec<_> = roots
            .iter()
            .map(|id| graph.get(*id).unwrap().to_one("author"))
            .collect();
        assert!(authors.iter().all(|a| *a == authors[0] && a.is_some()));
        assert_eq!(
            driver.lookup("Person", &PrimaryKey::from(10)),
            authors[0]
        );
    }

    /// A nested record can refer back to an ancestor by its key.
    #[test]
    fn test_reference_to_ancestor() {
        let mut driver = driver();
        let root = driver
            .marshal(
                "Article",
                &json!({"id": 1, "related": [{"id": 2, "related": [1]}]}),
            )
            .unwrap();

        let graph = driver.graph();
        let related = graph.get(root).unwrap().to_many("related");
        assert_eq!(related.len(), 1);
        assert_eq!(graph.get(related[0]).unwrap().to_many("related"), &[root]);
        assert_eq!(graph.records_of("Article").count(), 2);
        assert!(driver.report().is_clean());
    }

    #[test]
    fn test_unknown_reference_is_diagnostic() {
        let mut driver = driver();
        let root = driver
            .marshal("Article", &json!({"id": 1, "author": 99}))
            .unwrap();

        assert_eq!(driver.graph().get(root).unwrap().to_one("author"), None);
        assert!(matches!(
            driver.report().diagnostics[0].kind,
            DiagnosticKind::UnknownReference { .. }
        ));
    }

    /// Children cannot be bound to a parent without an identity.
    #[test]
    fn test_unidentified_parent_fails() {
        let mut driver = driver();
        let err = driver
            .marshal("Article", &json!({"title": "x", "comments": [{"body": "b"}]}))
            .unwrap_err();
        assert!(format!("{err:#}").contains("primary key is unresolved"));
    }

    #[test]
    fn test_rejects_non_objects() {
        let mut driver = driver();
        assert!(driver.marshal("Article", &json!("nope")).is_err());
        assert!(driver.marshal("Magazine", &json!({})).is_err());
    }
}
