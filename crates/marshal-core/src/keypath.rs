//! Key paths locating raw values inside a nested document.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An ordered locator into a nested document, e.g. `author.profile.name`.
///
/// Each segment names a key of a mapping; when the value being traversed is a
/// sequence, a numeric segment selects an element (`items.0.id`).
///
/// Key paths are written dot-separated in schema files. Keys that contain a
/// dot can be expressed as an explicit list of segments:
/// ```yaml
/// key_paths:
///   - headline
///   - [meta, "og.title"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a dot-separated key path.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self {
                segments: Vec::new(),
            };
        }
        Self {
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    /// Build a key path from explicit segments (no dot splitting).
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() || self.segments.iter().any(String::is_empty)
    }

    fn needs_segment_form(&self) -> bool {
        self.segments.iter().any(|s| s.contains('.'))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for KeyPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl Serialize for KeyPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.needs_segment_form() {
            self.segments.serialize(serializer)
        } else {
            serializer.collect_str(self)
        }
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Dotted(String),
            Segments(Vec<String>),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Dotted(path) => KeyPath::parse(&path),
            Repr::Segments(segments) => KeyPath::from_segments(segments),
        })
    }
}
