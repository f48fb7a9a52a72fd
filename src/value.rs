//! The closed set of value kinds a [`ConfigSource`](crate::ConfigSource) can be
//! asked for.
//!
//! A lookup names the kind it wants up front ([`ValueKind`]); the source answers
//! with a [`Value`] of that kind. Rust types that can be retrieved directly from
//! a source implement [`ConfigValue`]. Anything else is reached through a type
//! conversion stage on top of one of these.

use std::fmt;
use std::time::Duration;

/// The semantic type requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Long,
    Double,
    String,
    Duration,
    StringList,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "Bool",
            ValueKind::Int => "Int",
            ValueKind::Long => "Long",
            ValueKind::Double => "Double",
            ValueKind::String => "String",
            ValueKind::Duration => "Duration",
            ValueKind::StringList => "StringList",
        };
        f.write_str(name)
    }
}

/// A value as stored in, or produced by, a source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Duration(Duration),
    StringList(Vec<String>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Duration(_) => ValueKind::Duration,
            Value::StringList(_) => ValueKind::StringList,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Duration(d) => write!(f, "{}", humantime::format_duration(*d)),
            Value::StringList(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// A Rust type that a source can materialize directly.
pub trait ConfigValue: Sized + Clone + Send + Sync + 'static {
    /// The kind requested from the source when retrieving this type.
    const KIND: ValueKind;

    /// Extract `Self` from a value, or `None` if the value is of another kind.
    fn from_value(value: Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

macro_rules! config_value {
    ($ty:ty, $variant:ident) => {
        impl ConfigValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

config_value!(bool, Bool);
config_value!(i32, Int);
config_value!(i64, Long);
config_value!(f64, Double);
config_value!(String, String);
config_value!(Duration, Duration);
config_value!(Vec<String>, StringList);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}
