//! A read-only [`ConfigSource`] over a TOML document.
//!
//! Keys are dotted paths into nested tables: `"app.server.port"` addresses
//! `port` inside `[app.server]`. TOML values are mapped onto [`ValueKind`]s:
//!
//! | Requested kind | Accepted TOML value |
//! |----------------|---------------------|
//! | `Bool`         | boolean |
//! | `Int`          | integer that fits in 32 bits |
//! | `Long`         | integer |
//! | `Double`       | float or integer |
//! | `String`       | string |
//! | `Duration`     | string in humantime format (`"5s"`, `"1m 30s"`) |
//! | `StringList`   | array of strings |
//!
//! Anything else is reported as `WrongType`.

use std::path::Path;

use serde::Serialize;
use toml::Table;

use crate::error::ConfigError;
use crate::source::{ConfigSource, Getter};
use crate::value::{Value, ValueKind};

pub struct TomlConfigSource {
    name: String,
    origin: String,
    table: Table,
}

impl TomlConfigSource {
    pub fn new(name: &str, table: Table) -> Self {
        Self {
            name: name.to_string(),
            origin: "in-memory table".to_string(),
            table,
        }
    }

    /// Parse TOML text.
    pub fn parse(name: &str, content: &str) -> Result<Self, ConfigError> {
        let table: Table = toml::from_str(content).map_err(|e| ConfigError::Parse {
            origin: format!("source '{name}'"),
            source: e,
        })?;
        Ok(Self {
            name: name.to_string(),
            origin: "TOML string".to_string(),
            table,
        })
    }

    /// Read and parse a TOML file.
    pub fn from_file(name: &str, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let table: Table = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            origin: path.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            name: name.to_string(),
            origin: format!("file {}", path.display()),
            table,
        })
    }

    /// Build a source from any value that serializes to a table, e.g. a
    /// struct of defaults.
    pub fn from_serialize<S: Serialize>(name: &str, value: &S) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSource {
            name: name.to_string(),
            reason,
        };
        let value = toml::Value::try_from(value).map_err(|e| invalid(e.to_string()))?;
        match value {
            toml::Value::Table(table) => Ok(Self {
                name: name.to_string(),
                origin: "serialized value".to_string(),
                table,
            }),
            other => Err(invalid(format!(
                "expected a table, got {}",
                other.type_str()
            ))),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    fn lookup(&self, key: &str, kind: ValueKind) -> Result<Value, ConfigError> {
        let raw = table_get(&self.table, key).ok_or_else(|| {
            ConfigError::not_found(format!("key '{key}' not found in source '{}'", self.name))
        })?;
        convert(raw, kind).ok_or_else(|| {
            ConfigError::wrong_type(format!(
                "expected type {kind}, got {} for key '{key}' in source '{}'",
                raw.type_str(),
                self.name
            ))
        })
    }
}

impl ConfigSource for TomlConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("{} ({})", self.name, self.origin)
    }

    fn getter_for(&self, kind: ValueKind) -> Result<Getter<'_>, ConfigError> {
        Ok(Box::new(move |key: &str| self.lookup(key, kind)))
    }
}

/// Navigate a `toml::Table` by dotted key path (e.g. `"database.url"`).
fn table_get<'a>(table: &'a Table, dotted_key: &str) -> Option<&'a toml::Value> {
    let (path, leaf) = match dotted_key.rsplit_once('.') {
        Some((p, l)) => (Some(p), l),
        None => (None, dotted_key),
    };

    let tbl = match path {
        Some(path) => {
            let mut current = table;
            for segment in path.split('.') {
                current = current.get(segment)?.as_table()?;
            }
            current
        }
        None => table,
    };

    tbl.get(leaf)
}

/// Interpret a TOML value as `kind`, or `None` if it can't be.
pub(crate) fn convert(value: &toml::Value, kind: ValueKind) -> Option<Value> {
    use toml::Value as T;

    match (kind, value) {
        (ValueKind::Bool, T::Boolean(b)) => Some(Value::Bool(*b)),
        (ValueKind::Int, T::Integer(i)) => i32::try_from(*i).ok().map(Value::Int),
        (ValueKind::Long, T::Integer(i)) => Some(Value::Long(*i)),
        (ValueKind::Double, T::Float(f)) => Some(Value::Double(*f)),
        (ValueKind::Double, T::Integer(i)) => Some(Value::Double(*i as f64)),
        (ValueKind::String, T::String(s)) => Some(Value::String(s.clone())),
        (ValueKind::Duration, T::String(s)) => {
            humantime::parse_duration(s).ok().map(Value::Duration)
        }
        (ValueKind::StringList, T::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(Value::StringList),
        _ => None,
    }
}
