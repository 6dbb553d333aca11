//! Marshaling scenarios driven through the public API of every crate.

use chrono::{TimeZone, Utc};
use marshal_core::{
    AttributeDescriptor, AttributeValue, EntitySchema, RecordGraph, RelationshipDescriptor,
    SchemaRegistry, SemanticType,
};
use marshal_json::{render_record, CoercionConfig, DateFormat};
use record_marshaler::{Marshaler, ProtoRecord, Severity};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn registry() -> SchemaRegistry {
    SchemaRegistry::new(vec![
        EntitySchema::new("Person")
            .with_primary_key("id")
            .with_attribute(AttributeDescriptor::new("id", SemanticType::Integer64))
            .with_attribute(AttributeDescriptor::new("name", SemanticType::String)),
        EntitySchema::new("Tag")
            .with_attribute(AttributeDescriptor::new("label", SemanticType::String)),
        EntitySchema::new("Article")
            .with_primary_key("id")
            .with_attribute(AttributeDescriptor::new("id", SemanticType::Integer64))
            .with_attribute(
                AttributeDescriptor::new("title", SemanticType::String)
                    .with_key_paths(["headline", "name"]),
            )
            .with_attribute(AttributeDescriptor::new("views", SemanticType::Integer32))
            .with_attribute(
                AttributeDescriptor::new("published", SemanticType::Date)
                    .with_key_paths(["meta.published"]),
            )
            .with_attribute(
                AttributeDescriptor::new("status", SemanticType::String)
                    .with_default(json!("draft")),
            )
            .with_relationship(RelationshipDescriptor::to_one("author", "Person"))
            .with_relationship(RelationshipDescriptor::to_many("tags", "Tag")),
        EntitySchema::new("Revision")
            .with_attribute(AttributeDescriptor::new("note", SemanticType::String))
            .with_relationship(
                RelationshipDescriptor::to_one("parentRef", "Article").as_primary_key(),
            ),
    ])
    .unwrap()
}

fn proto(
    graph: &mut RecordGraph,
    registry: &SchemaRegistry,
    entity: &str,
    doc: serde_json::Value,
) -> ProtoRecord {
    let schema = Arc::clone(registry.entity(entity).unwrap());
    ProtoRecord::create(graph, schema, doc)
}

/// The first key path holding a value wins, in declaration order.
#[test]
fn test_title_from_fallback_key_path() {
    init_logging();
    let registry = registry();
    let marshaler = Marshaler::default();
    let mut graph = RecordGraph::new();

    let article = proto(&mut graph, &registry, "Article", json!({"name": "Report A"}));
    let report = marshaler.populate_attributes(&mut graph, &article).unwrap();
    assert_eq!(
        graph.get(article.record()).unwrap().get("title"),
        Some(&AttributeValue::from("Report A"))
    );
    assert!(report.is_clean());

    let both = proto(
        &mut graph,
        &registry,
        "Article",
        json!({"headline": "Headline", "name": "Name"}),
    );
    marshaler.populate_attributes(&mut graph, &both).unwrap();
    assert_eq!(
        graph.get(both.record()).unwrap().get("title"),
        Some(&AttributeValue::from("Headline"))
    );
}

/// Numeric strings and pattern dates are coerced to their declared types.
#[test]
fn test_coercion_of_strings() {
    init_logging();
    let registry = registry();
    let marshaler = Marshaler::new(
        CoercionConfig::default().with_date_format(DateFormat::pattern("YYYY-MM-DD")),
    );
    let mut graph = RecordGraph::new();

    let article = proto(
        &mut graph,
        &registry,
        "Article",
        json!({"id": "7", "views": "42", "meta": {"published": "2024-03-05"}}),
    );
    let report = marshaler.populate_attributes(&mut graph, &article).unwrap();
    let record = graph.get(article.record()).unwrap();

    assert_eq!(record.get("views"), Some(&AttributeValue::Integer(42)));
    assert_eq!(
        record.get("published"),
        Some(&AttributeValue::Date(
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        ))
    );
    assert_eq!(record.get("status"), Some(&AttributeValue::from("draft")));
    assert_eq!(report.defaults_applied, 1);
    assert!(report.is_clean());
}

/// A malformed value leaves the attribute unset and is reported.
#[test]
fn test_malformed_value_is_reported() {
    init_logging();
    let registry = registry();
    let mut graph = RecordGraph::new();

    let lenient = Marshaler::default();
    let article = proto(&mut graph, &registry, "Article", json!({"views": "many"}));
    let report = lenient.populate_attributes(&mut graph, &article).unwrap();
    assert!(!graph.get(article.record()).unwrap().contains("views"));
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].severity, Severity::Warning);

    let strict = Marshaler::new(CoercionConfig::default().strict());
    let article = proto(&mut graph, &registry, "Article", json!({"views": "many"}));
    let report = strict.populate_attributes(&mut graph, &article).unwrap();
    assert!(report.has_errors());
    assert_eq!(report.for_field("views").count(), 1);
}

/// To-one edges point at the registered target; to-many edges hold each
/// target once.
#[test]
fn test_relationships() {
    init_logging();
    let registry = registry();
    let marshaler = Marshaler::default();
    let mut graph = RecordGraph::new();

    let mut author = proto(&mut graph, &registry, "Person", json!({"id": 10}));
    marshaler.populate_attributes(&mut graph, &author).unwrap();
    author.resolve_primary_key(&graph);

    let tag = proto(&mut graph, &registry, "Tag", json!({"label": "rust"}));
    let other = proto(&mut graph, &registry, "Tag", json!({"label": "json"}));

    let mut article = proto(&mut graph, &registry, "Article", json!({"id": 1}));
    article.add_target("author", author.as_target());
    article.add_target("tags", tag.as_target());
    article.add_target("tags", other.as_target());
    article.add_target("tags", tag.as_target());

    let report = marshaler
        .establish_relationships(&mut graph, &mut article)
        .unwrap();
    let record = graph.get(article.record()).unwrap();
    assert_eq!(record.to_one("author"), Some(author.record()));
    assert_eq!(record.to_many("tags"), &[tag.record(), other.record()]);
    assert_eq!(report.edges_assigned, 1);
    assert_eq!(report.edges_inserted, 2);
    assert_eq!(report.duplicates_suppressed, 1);
}

/// A child is bound to its parent through the primary-key relationship and
/// inherits the parent's key.
#[test]
fn test_primary_key_relationship() {
    init_logging();
    let registry = registry();
    let marshaler = Marshaler::default();
    let mut graph = RecordGraph::new();

    let mut parent = proto(&mut graph, &registry, "Article", json!({"id": 3}));
    marshaler.populate_attributes(&mut graph, &parent).unwrap();
    parent.resolve_primary_key(&graph);

    let mut revision = proto(&mut graph, &registry, "Revision", json!({"note": "typo"}));
    marshaler.populate_attributes(&mut graph, &revision).unwrap();
    marshaler
        .bind_primary_key_relationship(&mut graph, &mut revision, &parent)
        .unwrap();

    assert_eq!(
        graph.get(revision.record()).unwrap().to_one("parentRef"),
        Some(parent.record())
    );
    assert_eq!(revision.primary_key(), parent.primary_key());

    let rendered = render_record(&graph, revision.record()).unwrap();
    assert_eq!(rendered["note"], json!("typo"));
    assert_eq!(rendered["parentRef"]["id"], json!(3));
}

/// A parent without a resolved key cannot be bound.
#[test]
fn test_unresolved_parent_is_error() {
    init_logging();
    let registry = registry();
    let marshaler = Marshaler::default();
    let mut graph = RecordGraph::new();

    let parent = proto(&mut graph, &registry, "Article", json!({"title": "x"}));
    let mut revision = proto(&mut graph, &registry, "Revision", json!({}));
    let err = marshaler
        .bind_primary_key_relationship(&mut graph, &mut revision, &parent)
        .unwrap_err();
    assert!(err.to_string().contains("primary key is unresolved"));
    assert_eq!(graph.get(revision.record()).unwrap().to_one("parentRef"), None);
}
