//! The boundary to configuration backends.

use crate::error::ConfigError;
use crate::value::{Value, ValueKind};

/// Looks up a single key as the kind the getter was created for.
pub type Getter<'a> = Box<dyn Fn(&str) -> Result<Value, ConfigError> + 'a>;

/// A place configuration values are retrieved from.
///
/// [`getter_for`](Self::getter_for) is asked for a [`ValueKind`] first and
/// fails with [`ConfigError::UnsupportedType`] if the source can never produce
/// that kind, independent of any key. The returned getter then fails with
/// `NotFound` when the key is absent and `WrongType` when the stored value is of
/// another kind.
///
/// Sources may change their content after construction. Callers must not hold
/// on to a getter beyond a single retrieval.
pub trait ConfigSource: Send + Sync {
    /// Stable identifier included in diagnostics.
    fn name(&self) -> &str;

    /// Human-readable description, e.g. where the values came from.
    fn description(&self) -> String {
        format!("{} (no description provided)", self.name())
    }

    fn getter_for(&self, kind: ValueKind) -> Result<Getter<'_>, ConfigError>;
}
