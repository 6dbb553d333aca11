//! Forward conversion: records → JSON value.
//!
//! Used to print populated records. Decimals are written as strings to keep
//! their precision, dates as RFC 3339 and binary values as base64.

use base64::Engine;
use marshal_core::{AttributeValue, Edge, Record, RecordGraph, RecordId};
use serde_json::{json, Map, Value};

/// Key holding the entity name of a rendered record.
pub const ENTITY_KEY: &str = "$entity";
/// Key holding the graph handle of a rendered record.
pub const ID_KEY: &str = "$id";
/// Key of the placeholder emitted when a record refers back to an ancestor.
pub const REF_KEY: &str = "$ref";

/// Wrapper for JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonValue(pub Value);

impl JsonValue {
    pub fn into_inner(self) -> Value {
        self.0
    }

    pub fn as_inner(&self) -> &Value {
        &self.0
    }
}

impl From<&AttributeValue> for JsonValue {
    fn from(value: &AttributeValue) -> Self {
        JsonValue(match value {
            AttributeValue::String(s) => json!(s),
            AttributeValue::Integer(i) => json!(i),
            AttributeValue::Float(f) => json!(f),
            AttributeValue::Decimal(d) => json!(d.to_string()),
            AttributeValue::Boolean(b) => json!(b),
            AttributeValue::Date(dt) => json!(dt.to_rfc3339()),
            AttributeValue::Binary(bytes) => {
                json!(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            AttributeValue::Opaque(v) => v.clone(),
        })
    }
}

/// Convert one attribute value to JSON.
pub fn attribute_value_to_json(value: &AttributeValue) -> Value {
    JsonValue::from(value).into_inner()
}

/// Render the attributes of a record, without following relationships.
pub fn record_to_json(record: &Record) -> Value {
    let mut map = Map::new();
    map.insert(ENTITY_KEY.to_string(), json!(record.entity()));
    for (name, value) in record.attributes() {
        map.insert(name.to_string(), attribute_value_to_json(value));
    }
    Value::Object(map)
}

/// Render a record and everything reachable from it.
///
/// Relationship edges are rendered inline: a to-one edge as an object (or
/// `null` once unset), a to-many edge as an array. A record that is already
/// being rendered further up the path is written as `{"$ref": "#n"}`.
/// Returns `None` when `id` is not in the graph.
pub fn render_record(graph: &RecordGraph, id: RecordId) -> Option<Value> {
    let mut path = Vec::new();
    render(graph, id, &mut path)
}

fn render(graph: &RecordGraph, id: RecordId, path: &mut Vec<RecordId>) -> Option<Value> {
    if path.contains(&id) {
        let mut placeholder = Map::new();
        placeholder.insert(REF_KEY.to_string(), json!(id.to_string()));
        return Some(Value::Object(placeholder));
    }
    let record = graph.get(id)?;

    path.push(id);
    let mut value = record_to_json(record);
    if let Value::Object(map) = &mut value {
        map.insert(ID_KEY.to_string(), json!(id.to_string()));
        for (name, edge) in record.edges() {
            let rendered = match edge {
                Edge::ToOne(Some(target)) => render(graph, *target, path).unwrap_or(Value::Null),
                Edge::ToOne(None) => Value::Null,
                Edge::ToMany(targets) => Value::Array(
                    targets
                        .iter()
                        .filter_map(|target| render(graph, *target, path))
                        .collect(),
                ),
            };
            map.insert(name.to_string(), rendered);
        }
    }
    path.pop();

    Some(value)
}
