use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::error::ConfigError;
use crate::source::{ConfigSource, Getter};
use crate::value::{Value, ValueKind};

/// A [`ConfigSource`] backed by an in-memory map that can be modified after
/// creation.
///
/// Chains built against the source see later modifications, which makes it the
/// natural source for tests. An optional delegate is queried for keys the map
/// doesn't contain.
pub struct MapConfigSource {
    name: String,
    values: RwLock<HashMap<String, Value>>,
    delegate: Option<Arc<dyn ConfigSource>>,
}

impl MapConfigSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            values: RwLock::new(HashMap::new()),
            delegate: None,
        }
    }

    /// Create a source pre-populated with `entries`.
    pub fn with_values<K, V>(name: &str, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let source = Self::new(name);
        for (key, value) in entries {
            source.insert(key, value);
        }
        source
    }

    /// Consult `delegate` for keys that are not present in this map.
    pub fn delegate_to(mut self, delegate: Arc<dyn ConfigSource>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn clear(&self) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.values.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, key: &str, kind: ValueKind) -> Result<Value, ConfigError> {
        let value = match self.get(key) {
            Some(value) => value,
            None => match &self.delegate {
                Some(delegate) => (delegate.getter_for(kind)?)(key)?,
                None => {
                    return Err(ConfigError::not_found(format!(
                        "key '{key}' not found in source '{}'",
                        self.name
                    )));
                }
            },
        };

        if value.kind() != kind {
            return Err(ConfigError::wrong_type(format!(
                "expected type {kind}, got type {} for key '{key}' in source '{}'",
                value.kind(),
                self.name
            )));
        }
        Ok(value)
    }
}

impl ConfigSource for MapConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("in-memory map '{}' with {} entries", self.name, self.len())
    }

    fn getter_for(&self, kind: ValueKind) -> Result<Getter<'_>, ConfigError> {
        Ok(Box::new(move |key: &str| self.lookup(key, kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnableToRetrieve;
    use std::time::Duration;

    fn get(source: &MapConfigSource, key: &str, kind: ValueKind) -> Result<Value, ConfigError> {
        (source.getter_for(kind)?)(key)
    }

    #[test]
    fn present_key_of_requested_kind() {
        let src = MapConfigSource::with_values("test", [("port", 8080_i64)]);
        assert_eq!(get(&src, "port", ValueKind::Long).unwrap(), Value::Long(8080));
    }

    #[test]
    fn missing_key_is_not_found() {
        let src = MapConfigSource::new("test");
        let err = get(&src, "port", ValueKind::Long).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Retrieve(UnableToRetrieve::NotFound(_))
        ));
        assert!(err.to_string().contains("test"));
    }

    #[test]
    fn stored_value_of_other_kind_is_wrong_type() {
        let src = MapConfigSource::with_values("test", [("port", "eighty")]);
        let err = get(&src, "port", ValueKind::Long).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Retrieve(UnableToRetrieve::WrongType(_))
        ));
        let msg = err.to_string();
        assert!(msg.contains("Long"));
        assert!(msg.contains("String"));
    }

    #[test]
    fn later_inserts_are_visible() {
        let src = MapConfigSource::new("test");
        assert!(get(&src, "enabled", ValueKind::Bool).is_err());
        src.insert("enabled", true);
        assert_eq!(get(&src, "enabled", ValueKind::Bool).unwrap(), Value::Bool(true));
        src.remove("enabled");
        assert!(get(&src, "enabled", ValueKind::Bool).is_err());
    }

    #[test]
    fn delegate_consulted_for_missing_keys() {
        let fallback = Arc::new(MapConfigSource::with_values(
            "fallback",
            [("timeout", Duration::from_secs(5))],
        ));
        let src = MapConfigSource::new("primary").delegate_to(fallback);
        assert_eq!(
            get(&src, "timeout", ValueKind::Duration).unwrap(),
            Value::Duration(Duration::from_secs(5))
        );
    }

    #[test]
    fn local_value_shadows_delegate() {
        let fallback = Arc::new(MapConfigSource::with_values("fallback", [("n", 1_i64)]));
        let src = MapConfigSource::with_values("primary", [("n", 2_i64)]).delegate_to(fallback);
        assert_eq!(get(&src, "n", ValueKind::Long).unwrap(), Value::Long(2));
    }

    #[test]
    fn clear_and_len() {
        let src = MapConfigSource::with_values("test", [("a", 1_i64), ("b", 2_i64)]);
        assert_eq!(src.len(), 2);
        src.clear();
        assert!(src.is_empty());
    }
}
