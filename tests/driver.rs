//! Whole-document marshaling from schema, config and input files.

use marshal_core::{AttributeValue, PrimaryKey, SchemaRegistry};
use marshal_json::render_record;
use record_marshal::{DocumentDriver, MarshalConfig};
use record_marshaler::{DiagnosticKind, Marshaler};
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

const SCHEMA: &str = r#"
version: 1
entities:
  - name: Person
    primary_key: id
    attributes:
      - name: id
        type: integer64
        key_paths: [id, person_id]
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
      - name: published
        type: date
        key_paths: [meta.published]
      - name: tags
        type:
          type: transformable
          transformer: comma_list
    relationships:
      - name: author
        cardinality: to_one
        destination: Person
      - name: comments
        cardinality: to_many
        destination: Comment
  - name: Comment
    attributes:
      - name: body
        type: string
      - name: score
        type: integer16
    relationships:
      - name: article
        cardinality: to_one
        destination: Article
        primary_key: true
"#;

const CONFIG: &str = r#"
entity = "Article"
date_format = "dd/MM/yyyy"
time_zone = "Europe/Berlin"
"#;

struct Fixture {
    _dir: TempDir,
    config: MarshalConfig,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let schema_path = dir.path().join("schema.yaml");
    let config_path = dir.path().join("marshal.toml");
    fs::write(&schema_path, SCHEMA).unwrap();
    fs::write(
        &config_path,
        format!("schema = {:?}\n{CONFIG}", schema_path.to_string_lossy()),
    )
    .unwrap();

    let config = MarshalConfig::from_file(&config_path).unwrap();
    Fixture { _dir: dir, config }
}

fn driver(config: &MarshalConfig) -> DocumentDriver {
    let registry = SchemaRegistry::from_file(config.schema.as_ref().unwrap()).unwrap();
    DocumentDriver::new(registry, Marshaler::new(config.coercion.clone()))
}

/// A feed of articles sharing authors becomes one connected graph.
#[test]
fn test_marshal_feed() {
    init_logging();
    let fixture = fixture();
    let mut driver = driver(&fixture.config);

    let feed = json!([
        {
            "id": 1,
            "headline": "Release notes",
            "meta": {"published": "05/03/2024"},
            "tags": "rust, json",
            "author": {"person_id": 10, "name": "Ada"},
            "comments": [{"body": "nice", "score": "5"}, {"body": "ok"}]
        },
        {
            "id": 2,
            "name": "Follow-up",
            "author": 10,
            "comments": []
        }
    ]);
    let entity = fixture.config.entity.clone().unwrap();
    let roots = driver.marshal_all(&entity, &feed).unwrap();
    assert_eq!(roots.len(), 2);

    let graph = driver.graph();
    assert_eq!(graph.records_of("Person").count(), 1);
    assert_eq!(graph.records_of("Comment").count(), 2);

    let first = graph.get(roots[0]).unwrap();
    let second = graph.get(roots[1]).unwrap();
    assert_eq!(first.get("title"), Some(&AttributeValue::from("Release notes")));
    assert_eq!(second.get("title"), Some(&AttributeValue::from("Follow-up")));
    assert_eq!(first.to_one("author"), second.to_one("author"));
    assert_eq!(
        first.get("tags"),
        Some(&AttributeValue::Opaque(json!(["rust", "json"])))
    );

    // Midnight in Berlin is 23:00 UTC the day before.
    let published = first.get("published").and_then(|v| v.as_date()).unwrap();
    assert_eq!(published.to_rfc3339(), "2024-03-04T23:00:00+00:00");

    let comments = first.to_many("comments");
    assert_eq!(comments.len(), 2);
    let comment = graph.get(comments[0]).unwrap();
    assert_eq!(comment.get("score"), Some(&AttributeValue::Integer(5)));
    assert_eq!(comment.to_one("article"), Some(roots[0]));

    assert_eq!(
        driver.lookup("Article", &PrimaryKey::from(2)),
        Some(roots[1])
    );
    assert!(driver.report().is_clean());
}

/// Output rendering embeds related records and marks cycles.
#[test]
fn test_render_feed() {
    init_logging();
    let fixture = fixture();
    let mut driver = driver(&fixture.config);

    let root = driver
        .marshal(
            "Article",
            &json!({"id": 1, "name": "Report A", "comments": [{"body": "first"}]}),
        )
        .unwrap();

    let rendered = render_record(driver.graph(), root).unwrap();
    assert_eq!(rendered["$entity"], json!("Article"));
    assert_eq!(rendered["title"], json!("Report A"));
    assert_eq!(rendered["comments"][0]["body"], json!("first"));
    assert_eq!(rendered["comments"][0]["article"]["$ref"], rendered["$id"]);
}

/// Bad values and dangling references are reported without failing the run.
#[test]
fn test_report_collects_diagnostics() {
    init_logging();
    let fixture = fixture();
    let mut driver = driver(&fixture.config);

    driver
        .marshal(
            "Article",
            &json!({
                "id": 1,
                "meta": {"published": "2024-03-05"},
                "author": 404,
                "comments": [{"body": "loud", "score": 70000}]
            }),
        )
        .unwrap();

    let report = driver.report();
    assert!(!report.has_errors());
    assert_eq!(report.warnings().count(), 3);
    assert_eq!(report.for_field("published").count(), 1);
    assert_eq!(report.for_field("score").count(), 1);
    assert!(report
        .for_field("author")
        .any(|d| matches!(d.kind, DiagnosticKind::UnknownReference { .. })));
}

/// Strict mode turns coercion warnings into errors.
#[test]
fn test_strict_config() {
    init_logging();
    let fixture = fixture();
    let config = MarshalConfig {
        coercion: fixture.config.coercion.clone().strict(),
        ..fixture.config.clone()
    };
    let mut driver = driver(&config);

    driver.marshal("Article", &json!({"id": "one"})).unwrap();
    assert!(driver.report().has_errors());
    assert_eq!(driver.report().errors().count(), 1);
}
