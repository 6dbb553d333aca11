//! Semantic attribute types and relationship cardinality.
//!
//! `SemanticType` is the declared destination type of an attribute. It decides
//! which coercion rule a raw document value goes through before it is stored
//! on a record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Declared destination type of an attribute.
///
/// # YAML Format
///
/// Simple types are written as strings:
/// ```yaml
/// type: string
/// type: integer64
/// type: date
/// ```
///
/// Transformable attributes name the transformer that produces their value:
/// ```yaml
/// type:
///   type: transformable
///   transformer: comma_list
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// Text
    String,

    /// 16-bit signed integer
    Integer16,

    /// 32-bit signed integer
    Integer32,

    /// 64-bit signed integer
    Integer64,

    /// 32-bit floating point
    Float,

    /// 64-bit floating point
    Double,

    /// Exact decimal
    Decimal,

    /// Boolean
    Boolean,

    /// Calendar date / instant
    Date,

    /// Raw bytes (base64 in documents)
    Binary,

    /// Opaque value produced by a named transformer.
    ///
    /// Without a transformer the raw document value is kept as-is.
    Transformable {
        /// Name of the registered transformer
        transformer: Option<String>,
    },
}

impl SemanticType {
    /// Create a transformable type bound to the named transformer.
    pub fn transformable(transformer: impl Into<String>) -> Self {
        Self::Transformable {
            transformer: Some(transformer.into()),
        }
    }

    /// Canonical name, as used in schema files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer16 => "integer16",
            Self::Integer32 => "integer32",
            Self::Integer64 => "integer64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Binary => "binary",
            Self::Transformable { .. } => "transformable",
        }
    }

    /// True for the integer, floating point and decimal types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Integer16
                | Self::Integer32
                | Self::Integer64
                | Self::Float
                | Self::Double
                | Self::Decimal
        )
    }

    /// Parse a simple (non-map) type name, accepting common aliases.
    pub fn from_simple_name(name: &str) -> Option<Self> {
        match name {
            "string" | "text" => Some(Self::String),
            "integer16" | "int16" | "small_int" => Some(Self::Integer16),
            "integer32" | "int32" | "int" | "integer" => Some(Self::Integer32),
            "integer64" | "int64" | "big_int" => Some(Self::Integer64),
            "float" => Some(Self::Float),
            "double" | "number" => Some(Self::Double),
            "decimal" => Some(Self::Decimal),
            "boolean" | "bool" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "binary" | "bytes" => Some(Self::Binary),
            "transformable" => Some(Self::Transformable { transformer: None }),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transformable {
                transformer: Some(name),
            } => write!(f, "transformable({name})"),
            other => f.write_str(other.name()),
        }
    }
}

impl Serialize for SemanticType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        match self {
            Self::Transformable {
                transformer: Some(name),
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "transformable")?;
                map.serialize_entry("transformer", name)?;
                map.end()
            }
            other => serializer.serialize_str(other.name()),
        }
    }
}

impl<'de> Deserialize<'de> for SemanticType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, MapAccess, Visitor};

        struct SemanticTypeVisitor;

        impl<'de> Visitor<'de> for SemanticTypeVisitor {
            type Value = SemanticType;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a type name or a map with a `type` key")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                SemanticType::from_simple_name(value)
                    .ok_or_else(|| E::custom(format!("unknown attribute type: {value}")))
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut type_name: Option<String> = None;
                let mut transformer: Option<String> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "type" => type_name = Some(map.next_value()?),
                        "transformer" => transformer = Some(map.next_value()?),
                        other => {
                            return Err(M::Error::custom(format!(
                                "unexpected attribute type field: {other}"
                            )))
                        }
                    }
                }

                let type_name = type_name.ok_or_else(|| M::Error::missing_field("type"))?;
                match SemanticType::from_simple_name(&type_name) {
                    Some(SemanticType::Transformable { .. }) => {
                        Ok(SemanticType::Transformable { transformer })
                    }
                    Some(_) if transformer.is_some() => Err(M::Error::custom(format!(
                        "`transformer` is only valid for transformable attributes, not {type_name}"
                    ))),
                    Some(simple) => Ok(simple),
                    None => Err(M::Error::custom(format!(
                        "unknown attribute type: {type_name}"
                    ))),
                }
            }
        }

        deserializer.deserialize_any(SemanticTypeVisitor)
    }
}

/// Whether a relationship points at one record or a collection of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one related record
    ToOne,
    /// Any number of related records, without duplicates
    ToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToOne => f.write_str("to_one"),
            Self::ToMany => f.write_str("to_many"),
        }
    }
}
