//! Entity schemas: which attributes and relationships an entity has, and
//! which document key paths feed them.
//!
//! ## Type Hierarchy
//!
//! - `AttributeDescriptor` - One attribute, its type and candidate key paths
//! - `RelationshipDescriptor` - One relationship edge to another entity
//! - `EntitySchema` - The attributes and relationships of one entity
//! - `SchemaRegistry` - Explicit mapping from entity name to schema
//!
//! ## YAML Format
//!
//! ```yaml
//! version: 1
//! entities:
//!   - name: Article
//!     primary_key: id
//!     attributes:
//!       - name: id
//!         type: integer64
//!       - name: title
//!         type: string
//!         key_paths: [headline, name]
//!     relationships:
//!       - name: author
//!         cardinality: to_one
//!         destination: Person
//! ```

use crate::keypath::KeyPath;
use crate::types::{Cardinality, SemanticType};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Entity not found in registry
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Two entities share a name
    #[error("Entity '{0}' is defined more than once")]
    DuplicateEntity(String),

    /// Two fields of one entity share a name
    #[error("Field '{field}' is defined more than once in entity '{entity}'")]
    DuplicateField { entity: String, field: String },

    /// A key path with no segments, or with an empty segment
    #[error("Field '{field}' of entity '{entity}' has an empty key path")]
    EmptyKeyPath { entity: String, field: String },

    /// Relationship destination is not a registered entity
    #[error("Relationship '{relationship}' of entity '{entity}' points at unknown entity '{destination}'")]
    UnknownDestination {
        entity: String,
        relationship: String,
        destination: String,
    },

    /// More than one relationship is flagged as the primary key
    #[error("Entity '{entity}' declares more than one primary key relationship")]
    MultiplePrimaryKeyRelationships { entity: String },

    /// `primary_key` names an attribute the entity does not declare
    #[error("Primary key attribute '{attribute}' not found in entity '{entity}'")]
    UnknownPrimaryKeyAttribute { entity: String, attribute: String },
}

pub type Result<T> = std::result::Result<T, SchemaError>;

// ============================================================================
// Descriptors
// ============================================================================

/// One attribute of an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeDescriptor {
    /// Attribute name on the destination record
    pub name: String,

    /// Declared destination type
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,

    /// Candidate source key paths, tried in order.
    ///
    /// When empty, the attribute name is the single candidate.
    #[serde(default)]
    pub key_paths: Vec<KeyPath>,

    /// Raw value applied when every candidate is absent and the record holds
    /// no value yet
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl AttributeDescriptor {
    /// Create an attribute whose only candidate key path is its own name.
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        let name = name.into();
        Self {
            key_paths: vec![KeyPath::parse(&name)],
            name,
            semantic_type,
            default: None,
        }
    }

    /// Replace the candidate key paths.
    pub fn with_key_paths<I, K>(mut self, key_paths: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyPath>,
    {
        self.key_paths = key_paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the raw default value.
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// One relationship of an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipDescriptor {
    /// Relationship name on the destination record
    pub name: String,

    /// To-one or to-many
    pub cardinality: Cardinality,

    /// Name of the related entity
    pub destination: String,

    /// Candidate key paths of the related sub-document(s) or identifiers.
    ///
    /// When empty, the relationship name is the single candidate.
    #[serde(default)]
    pub key_paths: Vec<KeyPath>,

    /// Whether this relationship identifies the record through its parent
    #[serde(default)]
    pub primary_key: bool,
}

impl RelationshipDescriptor {
    fn new(
        name: impl Into<String>,
        cardinality: Cardinality,
        destination: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            key_paths: vec![KeyPath::parse(&name)],
            name,
            cardinality,
            destination: destination.into(),
            primary_key: false,
        }
    }

    pub fn to_one(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::new(name, Cardinality::ToOne, destination)
    }

    pub fn to_many(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::new(name, Cardinality::ToMany, destination)
    }

    /// Replace the candidate key paths.
    pub fn with_key_paths<I, K>(mut self, key_paths: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<KeyPath>,
    {
        self.key_paths = key_paths.into_iter().map(Into::into).collect();
        self
    }

    /// Mark this relationship as the entity's primary key relationship.
    pub fn as_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

/// The attributes and relationships of one entity, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitySchema {
    /// Entity name
    pub name: String,

    /// Attribute holding the entity's primary key, if any
    #[serde(default)]
    pub primary_key: Option<String>,

    /// Attribute descriptors
    #[serde(default)]
    pub attributes: Vec<AttributeDescriptor>,

    /// Relationship descriptors
    #[serde(default)]
    pub relationships: Vec<RelationshipDescriptor>,
}

impl EntitySchema {
    /// Create an entity with no attributes or relationships.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_relationship(mut self, relationship: RelationshipDescriptor) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Name the attribute that holds the primary key.
    pub fn with_primary_key(mut self, attribute: impl Into<String>) -> Self {
        self.primary_key = Some(attribute.into());
        self
    }

    /// Get an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// The relationship flagged as primary key, if any.
    pub fn primary_key_relationship(&self) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|r| r.primary_key)
    }

    /// The descriptor of the primary key attribute, if any.
    pub fn primary_key_attribute(&self) -> Option<&AttributeDescriptor> {
        self.primary_key
            .as_deref()
            .and_then(|name| self.attribute(name))
    }

    /// Fill in default key paths and check the entity on its own.
    ///
    /// Destinations are checked by [`SchemaRegistry::new`], which knows the
    /// other entities.
    fn normalize(&mut self) -> Result<()> {
        let mut seen = HashSet::new();

        for attribute in &mut self.attributes {
            if !seen.insert(attribute.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    entity: self.name.clone(),
                    field: attribute.name.clone(),
                });
            }
            if attribute.key_paths.is_empty() {
                attribute.key_paths.push(KeyPath::parse(&attribute.name));
            }
            if attribute.key_paths.iter().any(KeyPath::is_empty) {
                return Err(SchemaError::EmptyKeyPath {
                    entity: self.name.clone(),
                    field: attribute.name.clone(),
                });
            }
        }

        for relationship in &mut self.relationships {
            if !seen.insert(relationship.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    entity: self.name.clone(),
                    field: relationship.name.clone(),
                });
            }
            if relationship.key_paths.is_empty() {
                relationship
                    .key_paths
                    .push(KeyPath::parse(&relationship.name));
            }
            if relationship.key_paths.iter().any(KeyPath::is_empty) {
                return Err(SchemaError::EmptyKeyPath {
                    entity: self.name.clone(),
                    field: relationship.name.clone(),
                });
            }
        }

        if self.relationships.iter().filter(|r| r.primary_key).count() > 1 {
            return Err(SchemaError::MultiplePrimaryKeyRelationships {
                entity: self.name.clone(),
            });
        }

        if let Some(pk) = &self.primary_key {
            if self.attribute(pk).is_none() {
                return Err(SchemaError::UnknownPrimaryKeyAttribute {
                    entity: self.name.clone(),
                    attribute: pk.clone(),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Registry
// ============================================================================

fn default_version() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default = "default_version")]
    #[allow(dead_code)]
    version: u32,
    entities: Vec<EntitySchema>,
}

/// Explicit mapping from entity name to its schema.
///
/// Schemas are shared as `Arc<EntitySchema>` so that proto-records can hold
/// the schema they are populated against without borrowing the registry.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: Vec<Arc<EntitySchema>>,
    entity_map: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Build a registry from entity schemas, validating them.
    pub fn new(entities: Vec<EntitySchema>) -> Result<Self> {
        let mut entity_map = HashMap::new();
        let mut normalized = Vec::with_capacity(entities.len());

        for (idx, mut entity) in entities.into_iter().enumerate() {
            entity.normalize()?;
            if entity_map.insert(entity.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateEntity(entity.name));
            }
            normalized.push(entity);
        }

        for entity in &normalized {
            for relationship in &entity.relationships {
                if !entity_map.contains_key(&relationship.destination) {
                    return Err(SchemaError::UnknownDestination {
                        entity: entity.name.clone(),
                        relationship: relationship.name.clone(),
                        destination: relationship.destination.clone(),
                    });
                }
            }
        }

        Ok(Self {
            entities: normalized.into_iter().map(Arc::new).collect(),
            entity_map,
        })
    }

    /// Load a registry from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a registry from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: SchemaDocument = serde_yaml::from_str(yaml)?;
        Self::new(document.entities)
    }

    /// Get an entity schema by name.
    pub fn get(&self, name: &str) -> Option<&Arc<EntitySchema>> {
        self.entity_map
            .get(name)
            .and_then(|&idx| self.entities.get(idx))
    }

    /// Get an entity schema by name, failing when it is not registered.
    pub fn entity(&self, name: &str) -> Result<&Arc<EntitySchema>> {
        self.get(name)
            .ok_or_else(|| SchemaError::EntityNotFound(name.to_string()))
    }

    /// All entity names, in declaration order.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
