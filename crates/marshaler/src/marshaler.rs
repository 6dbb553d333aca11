//! The marshaler and its builder.

use crate::error::{MarshalError, Result};
use crate::proto::ProtoRecord;
use crate::strategy::{
    CoercingSetter, DirectEdges, EdgeEstablisher, FirstPresent, KeyPathPolicy, ValueSetter,
};
use marshal_core::{Record, RecordGraph};
use marshal_json::{CoercionConfig, CoercionMode, TransformerRegistry, ValueCoercer};
use std::fmt;
use std::sync::Arc;

/// Populates records from their source documents and wires their edges.
///
/// A `Marshaler` holds no per-pass state, so one instance can serve many
/// graphs, on several threads if needed.
///
/// # Example
///
/// ```rust
/// use marshal_core::{AttributeDescriptor, EntitySchema, RecordGraph, SemanticType};
/// use record_marshaler::{Marshaler, ProtoRecord};
/// use std::sync::Arc;
///
/// let schema = Arc::new(EntitySchema::new("Article").with_attribute(
///     AttributeDescriptor::new("title", SemanticType::String)
///         .with_key_paths(["headline", "name"]),
/// ));
///
/// let marshaler = Marshaler::default();
/// let mut graph = RecordGraph::new();
/// let proto = ProtoRecord::create(&mut graph, schema, serde_json::json!({"name": "Report A"}));
///
/// let report = marshaler.populate_attributes(&mut graph, &proto).unwrap();
/// assert!(report.is_clean());
/// assert_eq!(
///     graph.get(proto.record()).unwrap().get("title").and_then(|v| v.as_str()),
///     Some("Report A")
/// );
/// ```
#[derive(Clone)]
pub struct Marshaler {
    pub(crate) coercer: ValueCoercer,
    pub(crate) key_paths: Arc<dyn KeyPathPolicy>,
    pub(crate) setter: Arc<dyn ValueSetter>,
    pub(crate) edges: Arc<dyn EdgeEstablisher>,
}

impl Marshaler {
    /// Create a marshaler with the default strategies and built-in transformers.
    pub fn new(config: CoercionConfig) -> Self {
        Self::builder().with_config(config).build()
    }

    pub fn builder() -> MarshalerBuilder {
        MarshalerBuilder::default()
    }

    pub fn coercer(&self) -> &ValueCoercer {
        &self.coercer
    }

    pub fn mode(&self) -> CoercionMode {
        self.coercer.config().mode
    }
}

impl Default for Marshaler {
    fn default() -> Self {
        Self::new(CoercionConfig::default())
    }
}

impl fmt::Debug for Marshaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marshaler")
            .field("coercer", &self.coercer)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Marshaler`].
#[derive(Default)]
pub struct MarshalerBuilder {
    config: CoercionConfig,
    transformers: Option<TransformerRegistry>,
    key_paths: Option<Arc<dyn KeyPathPolicy>>,
    setter: Option<Arc<dyn ValueSetter>>,
    edges: Option<Arc<dyn EdgeEstablisher>>,
}

impl MarshalerBuilder {
    pub fn with_config(mut self, config: CoercionConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the built-in transformers.
    pub fn with_transformers(mut self, transformers: TransformerRegistry) -> Self {
        self.transformers = Some(transformers);
        self
    }

    pub fn with_key_path_policy(mut self, policy: impl KeyPathPolicy + 'static) -> Self {
        self.key_paths = Some(Arc::new(policy));
        self
    }

    pub fn with_value_setter(mut self, setter: impl ValueSetter + 'static) -> Self {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn with_edge_establisher(mut self, edges: impl EdgeEstablisher + 'static) -> Self {
        self.edges = Some(Arc::new(edges));
        self
    }

    pub fn build(self) -> Marshaler {
        let coercer = ValueCoercer::new(self.config);
        let coercer = match self.transformers {
            Some(transformers) => coercer.with_transformers(transformers),
            None => coercer,
        };

        Marshaler {
            coercer,
            key_paths: self.key_paths.unwrap_or_else(|| Arc::new(FirstPresent)),
            setter: self.setter.unwrap_or_else(|| Arc::new(CoercingSetter)),
            edges: self.edges.unwrap_or_else(|| Arc::new(DirectEdges)),
        }
    }
}

/// The proto-record's destination record, checked against its schema.
pub(crate) fn record_mut<'g>(
    graph: &'g mut RecordGraph,
    proto: &ProtoRecord,
) -> Result<&'g mut Record> {
    let record = graph
        .get_mut(proto.record())
        .ok_or(MarshalError::UnknownRecord {
            record: proto.record(),
        })?;

    if record.entity() != proto.entity() {
        return Err(MarshalError::EntityMismatch {
            record: proto.record(),
            expected: proto.entity().to_string(),
            actual: record.entity().to_string(),
        });
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marshal_core::{AttributeValue, EntitySchema};
    use serde_json::json;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_marshaler_is_send_sync() {
        assert_send_sync::<Marshaler>();
    }

    #[test]
    fn test_builder_config() {
        let marshaler = Marshaler::builder()
            .with_config(CoercionConfig::new().strict())
            .with_transformers(TransformerRegistry::new().with("upper", |raw| {
                Ok(AttributeValue::from(raw.to_string().to_uppercase()))
            }))
            .build();

        assert_eq!(marshaler.mode(), CoercionMode::Strict);
        assert!(marshaler.coercer().transformers().contains("upper"));
        assert!(!marshaler.coercer().transformers().contains("passthrough"));
        assert_eq!(Marshaler::default().mode(), CoercionMode::Lenient);
    }

    #[test]
    fn test_record_mut_checks() {
        let mut graph = RecordGraph::new();
        let person = graph.insert(Record::new("Person"));
        let schema = Arc::new(EntitySchema::new("Article"));

        let mismatched = ProtoRecord::new(person, Arc::clone(&schema), json!({}));
        assert!(matches!(
            record_mut(&mut graph, &mismatched),
            Err(MarshalError::EntityMismatch { .. })
        ));

        let mut other = RecordGraph::new();
        let proto = ProtoRecord::create(&mut other, schema, json!({}));
        let mut empty = RecordGraph::new();
        assert_eq!(
            record_mut(&mut empty, &proto).unwrap_err(),
            MarshalError::UnknownRecord {
                record: proto.record()
            }
        );
    }
}
