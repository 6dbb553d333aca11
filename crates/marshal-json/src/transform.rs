//! Named transformers for `transformable` attributes.
//!
//! A transformer receives the raw document value untouched and returns the
//! destination value. Transformers are looked up by the name declared on the
//! attribute's type.

use marshal_core::AttributeValue;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value transformer. Errors are reported as plain messages.
pub type Transformer = Arc<dyn Fn(&Value) -> Result<AttributeValue, String> + Send + Sync>;

/// Registry of transformers by name.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    transformers: BTreeMap<String, Transformer>,
}

impl TransformerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in transformers:
    ///
    /// - `json_string`: parses a string holding JSON text
    /// - `comma_list`: splits a comma-separated string into a list
    /// - `passthrough`: keeps the raw value as is
    pub fn with_builtins() -> Self {
        Self::new()
            .with("json_string", json_string)
            .with("comma_list", comma_list)
            .with("passthrough", |raw: &Value| {
                Ok(AttributeValue::Opaque(raw.clone()))
            })
    }

    /// Add a transformer, builder style.
    pub fn with<F>(mut self, name: impl Into<String>, transformer: F) -> Self
    where
        F: Fn(&Value) -> Result<AttributeValue, String> + Send + Sync + 'static,
    {
        self.register(name, transformer);
        self
    }

    /// Register a transformer, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, transformer: F)
    where
        F: Fn(&Value) -> Result<AttributeValue, String> + Send + Sync + 'static,
    {
        self.transformers.insert(name.into(), Arc::new(transformer));
    }

    pub fn get(&self, name: &str) -> Option<&Transformer> {
        self.transformers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transformers.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transformers.keys().map(String::as_str)
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

fn json_string(raw: &Value) -> Result<AttributeValue, String> {
    match raw {
        Value::String(s) => serde_json::from_str(s)
            .map(AttributeValue::Opaque)
            .map_err(|e| format!("invalid JSON text: {e}")),
        other => Ok(AttributeValue::Opaque(other.clone())),
    }
}

fn comma_list(raw: &Value) -> Result<AttributeValue, String> {
    match raw {
        Value::String(s) if s.trim().is_empty() => Ok(AttributeValue::Opaque(Value::Array(vec![]))),
        Value::String(s) => Ok(AttributeValue::Opaque(Value::Array(
            s.split(',')
                .map(|item| Value::String(item.trim().to_string()))
                .collect(),
        ))),
        Value::Array(_) => Ok(AttributeValue::Opaque(raw.clone())),
        other => Err(format!(
            "expected a comma-separated string, got {}",
            crate::error::json_kind(other)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_registered() {
        let registry = TransformerRegistry::with_builtins();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["comma_list", "json_string", "passthrough"]
        );
        assert!(!registry.contains("upper"));
    }

    #[test]
    fn test_json_string() {
        let registry = TransformerRegistry::with_builtins();
        let transform = registry.get("json_string").unwrap();

        let value = transform(&json!("{\"a\": [1, 2]}")).unwrap();
        assert_eq!(value, AttributeValue::Opaque(json!({"a": [1, 2]})));
        assert!(transform(&json!("{broken")).is_err());
    }

    #[test]
    fn test_comma_list() {
        let registry = TransformerRegistry::with_builtins();
        let transform = registry.get("comma_list").unwrap();

        assert_eq!(
            transform(&json!("read, write,admin")).unwrap(),
            AttributeValue::Opaque(json!(["read", "write", "admin"]))
        );
        assert_eq!(
            transform(&json!("")).unwrap(),
            AttributeValue::Opaque(json!([]))
        );
        assert!(transform(&json!(5)).is_err());
    }

    /// Registering under an existing name replaces the transformer.
    #[test]
    fn test_register_custom() {
        let mut registry = TransformerRegistry::with_builtins();
        registry.register("passthrough", |_: &Value| Ok(AttributeValue::from("fixed")));
        registry.register("upper", |raw: &Value| {
            raw.as_str()
                .map(|s| AttributeValue::from(s.to_uppercase()))
                .ok_or_else(|| "not a string".to_string())
        });

        let upper = registry.get("upper").unwrap();
        assert_eq!(upper(&json!("abc")).unwrap(), AttributeValue::from("ABC"));

        let passthrough = registry.get("passthrough").unwrap();
        assert_eq!(
            passthrough(&json!(1)).unwrap(),
            AttributeValue::from("fixed")
        );
        assert!(format!("{registry:?}").contains("upper"));
    }
}
