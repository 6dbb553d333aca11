//! Attribute population.

use crate::diagnostic::{Diagnostic, PopulationReport, Severity};
use crate::error::Result;
use crate::marshaler::{record_mut, Marshaler};
use crate::proto::ProtoRecord;
use crate::strategy::SetOutcome;
use marshal_core::{AttributeDescriptor, Record, RecordGraph};
use marshal_json::{CoercionError, CoercionMode, Resolution};
use serde_json::Value;
use tracing::{debug, warn};

impl Marshaler {
    /// Populate every attribute of the proto-record's destination record from
    /// its source document, in declaration order.
    ///
    /// - No candidate present: the default is applied when the descriptor has
    ///   one and the field is still unset; otherwise the field is left alone.
    /// - Explicit `null`: the field is cleared.
    /// - Value present: it is coerced and stored. A coercion failure leaves
    ///   the field untouched and is recorded in the report.
    ///
    /// Only a destination record missing from `graph` is an error.
    pub fn populate_attributes(
        &self,
        graph: &mut RecordGraph,
        proto: &ProtoRecord,
    ) -> Result<PopulationReport> {
        let record = record_mut(graph, proto)?;
        let mut report = PopulationReport::new();

        for attribute in &proto.schema().attributes {
            match self.key_paths.resolve(&attribute.key_paths, proto.document()) {
                Resolution::Absent => match &attribute.default {
                    Some(default) if !record.contains(&attribute.name) => {
                        debug!(
                            "{}.{}: no candidate present, applying default",
                            proto.entity(),
                            attribute.name
                        );
                        if self.apply(record, proto, attribute, default, &mut report) {
                            report.defaults_applied += 1;
                        }
                    }
                    _ => {
                        debug!("{}.{}: no candidate present", proto.entity(), attribute.name);
                        report.attributes_skipped += 1;
                    }
                },
                resolution => {
                    let raw = resolution.value().unwrap_or(&Value::Null);
                    if let Some(key_path) = resolution.key_path() {
                        debug!(
                            "{}.{}: resolved from '{key_path}'",
                            proto.entity(),
                            attribute.name
                        );
                    }
                    self.apply(record, proto, attribute, raw, &mut report);
                }
            }
        }

        Ok(report)
    }

    /// Run the value setter, tallying the outcome. Returns whether a value was
    /// stored.
    fn apply(
        &self,
        record: &mut Record,
        proto: &ProtoRecord,
        attribute: &AttributeDescriptor,
        raw: &Value,
        report: &mut PopulationReport,
    ) -> bool {
        match self.setter.set_value(record, attribute, raw, &self.coercer) {
            Ok(SetOutcome::Set { .. }) => {
                report.attributes_set += 1;
                true
            }
            Ok(SetOutcome::Cleared) => {
                report.attributes_cleared += 1;
                false
            }
            Ok(SetOutcome::Unchanged) => false,
            Err(error) => {
                report.push(self.coercion_diagnostic(proto, attribute, error));
                false
            }
        }
    }

    fn coercion_diagnostic(
        &self,
        proto: &ProtoRecord,
        attribute: &AttributeDescriptor,
        error: CoercionError,
    ) -> Diagnostic {
        let severity = match self.mode() {
            CoercionMode::Lenient => Severity::Warning,
            CoercionMode::Strict => Severity::Error,
        };
        warn!(
            "{}.{}: could not coerce value to {}: {error}",
            proto.entity(),
            attribute.name,
            attribute.semantic_type
        );
        Diagnostic::new(proto.entity(), attribute.name.as_str(), severity, error.into())
    }
}
