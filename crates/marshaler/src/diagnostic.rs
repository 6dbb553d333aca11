//! Non-fatal findings collected during a pass.

use marshal_core::RecordId;
use marshal_json::CoercionError;
use std::fmt;
use thiserror::Error;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// What went wrong with one field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// The raw value could not be coerced; the field was left untouched
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// A registered target is not in the graph
    #[error("Target {target} is not in the graph")]
    UnresolvedTarget { target: RecordId },

    /// A registered target is not an instance of the relationship's destination
    #[error("Target {target} is a '{actual}', expected '{expected}'")]
    DestinationMismatch {
        target: RecordId,
        expected: String,
        actual: String,
    },

    /// A relationship value names a primary key no known record carries
    #[error("No '{destination}' record with primary key {key}")]
    UnknownReference { destination: String, key: String },

    /// Several targets were registered for a to-one relationship; the last one won
    #[error("{count} targets supplied for a to-one relationship; the last one was kept")]
    MultipleToOneTargets { count: usize },
}

/// A non-fatal finding about one field of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Entity of the record being populated
    pub entity: String,
    /// Attribute or relationship name
    pub field: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(
        entity: impl Into<String>,
        field: impl Into<String>,
        severity: Severity,
        kind: DiagnosticKind,
    ) -> Self {
        Self {
            entity: entity.into(),
            field: field.into(),
            severity,
            kind,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}.{}: {}",
            self.severity, self.entity, self.field, self.kind
        )
    }
}

/// Outcome of one or more passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationReport {
    /// Attributes that received a value.
    pub attributes_set: usize,
    /// Attributes cleared by an explicit null.
    pub attributes_cleared: usize,
    /// Attributes that received their default.
    pub defaults_applied: usize,
    /// Attributes with no candidate present, left as they were.
    pub attributes_skipped: usize,
    /// To-one edges assigned, primary-key bindings included.
    pub edges_assigned: usize,
    /// Targets added to to-many edges.
    pub edges_inserted: usize,
    /// To-many insertions suppressed because the target was already present.
    pub duplicates_suppressed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl PopulationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether any diagnostic has error severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// Diagnostics recorded for one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.field == field)
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: PopulationReport) {
        self.attributes_set += other.attributes_set;
        self.attributes_cleared += other.attributes_cleared;
        self.defaults_applied += other.defaults_applied;
        self.attributes_skipped += other.attributes_skipped;
        self.edges_assigned += other.edges_assigned;
        self.edges_inserted += other.edges_inserted;
        self.duplicates_suppressed += other.duplicates_suppressed;
        self.diagnostics.extend(other.diagnostics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coercion(severity: Severity) -> Diagnostic {
        Diagnostic::new(
            "Article",
            "views",
            severity,
            CoercionError::InvalidNumber {
                value: "many".to_string(),
            }
            .into(),
        )
    }

    #[test]
    fn test_has_errors() {
        let mut report = PopulationReport::new();
        assert!(report.is_clean());

        report.push(coercion(Severity::Warning));
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 1);

        report.push(coercion(Severity::Error));
        assert!(report.has_errors());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.for_field("views").count(), 2);
    }

    #[test]
    fn test_merge() {
        let mut first = PopulationReport {
            attributes_set: 2,
            edges_inserted: 1,
            ..Default::default()
        };
        let mut second = PopulationReport {
            attributes_set: 1,
            duplicates_suppressed: 1,
            ..Default::default()
        };
        second.push(coercion(Severity::Warning));

        first.merge(second);
        assert_eq!(first.attributes_set, 3);
        assert_eq!(first.edges_inserted, 1);
        assert_eq!(first.duplicates_suppressed, 1);
        assert_eq!(first.diagnostics.len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            coercion(Severity::Warning).to_string(),
            "warning: Article.views: Invalid number: many"
        );
    }
}
