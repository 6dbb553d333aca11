//! Key-path lookup over JSON documents.
//!
//! A lookup distinguishes three outcomes: the key path holds a value, it holds
//! an explicit `null`, or it leads nowhere. Only the last one lets the
//! fallback chain move on to the next candidate.

use marshal_core::KeyPath;
use serde_json::Value;

/// Outcome of resolving a list of candidate key paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// A non-null value was found under `key_path`.
    Present {
        value: &'a Value,
        key_path: &'a KeyPath,
    },
    /// `key_path` exists and holds an explicit `null`.
    Null { key_path: &'a KeyPath },
    /// No candidate leads to a value.
    Absent,
}

impl<'a> Resolution<'a> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null { .. })
    }

    /// The resolved value; `null` for [`Resolution::Null`].
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Self::Present { value, .. } => Some(value),
            Self::Null { .. } => Some(&Value::Null),
            Self::Absent => None,
        }
    }

    /// The key path that produced the value.
    pub fn key_path(&self) -> Option<&'a KeyPath> {
        match self {
            Self::Present { key_path, .. } | Self::Null { key_path } => Some(key_path),
            Self::Absent => None,
        }
    }
}

/// Follow `key_path` through `document`.
///
/// Mapping segments select keys; on a sequence, a numeric segment selects an
/// element. Returns `None` when any segment leads nowhere, including through
/// an intermediate `null`.
pub fn lookup<'a>(document: &'a Value, key_path: &KeyPath) -> Option<&'a Value> {
    key_path
        .segments()
        .iter()
        .try_fold(document, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Resolve the first candidate that leads to a value.
///
/// Candidates are tried in order; the first one that exists wins, including
/// when it holds `null`.
pub fn resolve_first<'a>(candidates: &'a [KeyPath], document: &'a Value) -> Resolution<'a> {
    for key_path in candidates {
        match lookup(document, key_path) {
            Some(Value::Null) => return Resolution::Null { key_path },
            Some(value) => return Resolution::Present { value, key_path },
            None => continue,
        }
    }
    Resolution::Absent
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(candidates: &[&str]) -> Vec<KeyPath> {
        candidates.iter().map(|c| KeyPath::parse(c)).collect()
    }

    #[test]
    fn test_lookup_nested_mapping() {
        let doc = json!({"author": {"profile": {"name": "Ada"}}});
        let value = lookup(&doc, &KeyPath::parse("author.profile.name"));
        assert_eq!(value, Some(&json!("Ada")));
    }

    #[test]
    fn test_lookup_sequence_index() {
        let doc = json!({"items": [{"id": 1}, {"id": 2}]});
        assert_eq!(lookup(&doc, &KeyPath::parse("items.1.id")), Some(&json!(2)));
        assert_eq!(lookup(&doc, &KeyPath::parse("items.5.id")), None);
        assert_eq!(lookup(&doc, &KeyPath::parse("items.first")), None);
    }

    /// Traversal cannot continue through a scalar or a null.
    #[test]
    fn test_lookup_through_scalar_is_absent() {
        let doc = json!({"author": "Ada", "editor": null});
        assert_eq!(lookup(&doc, &KeyPath::parse("author.name")), None);
        assert_eq!(lookup(&doc, &KeyPath::parse("editor.name")), None);
    }

    /// The value under the k-th candidate wins when earlier candidates are absent.
    #[test]
    fn test_fallback_order() {
        let candidates = paths(&["headline", "title", "name"]);
        let doc = json!({"name": "Report A", "title": "Report B"});

        match resolve_first(&candidates, &doc) {
            Resolution::Present { value, key_path } => {
                assert_eq!(value, &json!("Report B"));
                assert_eq!(key_path.to_string(), "title");
            }
            other => panic!("expected a present value, got {other:?}"),
        }
    }

    #[test]
    fn test_first_listed_wins() {
        let candidates = paths(&["headline", "name"]);
        let doc = json!({"name": "second", "headline": "first"});
        assert_eq!(resolve_first(&candidates, &doc).value(), Some(&json!("first")));
    }

    /// An explicit null is present and stops the fallback chain.
    #[test]
    fn test_null_is_not_absent() {
        let candidates = paths(&["headline", "name"]);
        let doc = json!({"headline": null, "name": "Report A"});

        let resolution = resolve_first(&candidates, &doc);
        assert!(resolution.is_null());
        assert_eq!(resolution.value(), Some(&Value::Null));
        assert_eq!(resolution.key_path().map(ToString::to_string), Some("headline".to_string()));
    }

    #[test]
    fn test_absent() {
        let candidates = paths(&["headline", "name"]);
        let doc = json!({"body": "x"});
        let resolution = resolve_first(&candidates, &doc);
        assert!(resolution.is_absent());
        assert_eq!(resolution.value(), None);
    }
}
