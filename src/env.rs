use std::collections::HashMap;

use toml::Value as TomlValue;

use crate::error::ConfigError;
use crate::source::{ConfigSource, Getter};
use crate::toml_source::convert;
use crate::value::{Value, ValueKind};

/// A [`ConfigSource`] over environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels and maps to `.` in keys, so
/// `MYAPP__SERVER__PORT` is looked up as `server.port`. Single `_` within a
/// segment is literal. Keys are case-insensitive.
///
/// Every variable is stored under its own flat key, so `MYAPP__DB` and
/// `MYAPP__DB__URL` can both be set and read as `db` and `db.url`.
///
/// Values are parsed heuristically (bool > integer > float > string) and then
/// served with the same rules as [`TomlConfigSource`](crate::TomlConfigSource),
/// so `MYAPP__TIMEOUT=5s` can be read as a `Duration`. Lists are not
/// representable and are rejected as unsupported.
pub struct EnvConfigSource {
    name: String,
    prefix: String,
    values: HashMap<String, TomlValue>,
}

impl EnvConfigSource {
    /// Build from explicit pairs, so tests can pass synthetic data instead of
    /// `std::env::vars()`.
    pub fn new(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            name: format!("env:{prefix}"),
            prefix: prefix.to_string(),
            values: env_to_keys(prefix, vars),
        }
    }

    /// Snapshot the process environment.
    pub fn from_env(prefix: &str) -> Self {
        Self::new(prefix, std::env::vars())
    }

    fn lookup(&self, key: &str, kind: ValueKind) -> Result<Value, ConfigError> {
        let raw = self.values.get(&key.to_lowercase()).ok_or_else(|| {
            ConfigError::not_found(format!(
                "key '{key}' not found in source '{}' (variable {})",
                self.name,
                var_name(&self.prefix, key)
            ))
        })?;
        convert(raw, kind).ok_or_else(|| {
            ConfigError::wrong_type(format!(
                "expected type {kind}, got {} for variable {}",
                raw.type_str(),
                var_name(&self.prefix, key)
            ))
        })
    }
}

impl ConfigSource for EnvConfigSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("environment variables with prefix {}__", self.prefix)
    }

    fn getter_for(&self, kind: ValueKind) -> Result<Getter<'_>, ConfigError> {
        if kind == ValueKind::StringList {
            return Err(ConfigError::UnsupportedType(kind.to_string()));
        }
        Ok(Box::new(move |key: &str| self.lookup(key, kind)))
    }
}

/// The variable a dotted key is read from.
fn var_name(prefix: &str, key: &str) -> String {
    let rest: Vec<String> = key.split('.').map(str::to_uppercase).collect();
    format!("{prefix}__{}", rest.join("__"))
}

/// Map `{PREFIX}__A__B=v` variables to lowercased dotted keys (`a.b`).
fn env_to_keys(
    prefix: &str,
    vars: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, TomlValue> {
    let needle = format!("{prefix}__");
    vars.into_iter()
        .filter_map(|(key, value)| {
            let rest = key.strip_prefix(&needle)?;
            if rest.is_empty() || rest.split("__").any(str::is_empty) {
                return None;
            }
            let dotted = rest.split("__").collect::<Vec<_>>().join(".").to_lowercase();
            Some((dotted, parse_env_value(&value)))
        })
        .collect()
}

/// Parse an env var value into a typed TOML value.
/// Tries: bool → integer → float → string.
fn parse_env_value(s: &str) -> TomlValue {
    if s.eq_ignore_ascii_case("true") {
        return TomlValue::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return TomlValue::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return TomlValue::Integer(i);
    }
    // Require a dot so "NaN" / "inf" stay strings.
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return TomlValue::Float(f);
    }
    TomlValue::String(s.to_string())
}
