use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Boxed cause carried by [`UnableToRetrieve::Error`].
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Why a supplier could not produce a value.
///
/// Every failure that leaves a [`Supplier`](crate::Supplier) is one of these.
/// The type is `Clone` so a cached failure can be handed out on every access.
#[derive(Debug, Clone, Error)]
pub enum UnableToRetrieve {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Wrong type: {0}")]
    WrongType(String),

    #[error("Deprecated: {0}")]
    Deprecated(String),

    #[error("Condition not met: {0}")]
    ConditionNotMet(String),

    #[error("Error retrieving value: {0}")]
    Error(Cause),
}

impl UnableToRetrieve {
    /// Wrap an arbitrary error as [`UnableToRetrieve::Error`].
    pub fn error<E>(cause: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        UnableToRetrieve::Error(Arc::from(cause.into()))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, UnableToRetrieve::NotFound(_))
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, UnableToRetrieve::Deprecated(_))
    }

    pub fn is_condition_not_met(&self) -> bool {
        matches!(self, UnableToRetrieve::ConditionNotMet(_))
    }

    /// Short name of the variant, used when several failures are reported together.
    pub fn kind(&self) -> &'static str {
        match self {
            UnableToRetrieve::NotFound(_) => "NotFound",
            UnableToRetrieve::WrongType(_) => "WrongType",
            UnableToRetrieve::Deprecated(_) => "Deprecated",
            UnableToRetrieve::ConditionNotMet(_) => "ConditionNotMet",
            UnableToRetrieve::Error(_) => "Error",
        }
    }
}

/// Errors raised by config sources, settings loading, and chain construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Retrieve(#[from] UnableToRetrieve),

    #[error("Type {0} not supported by this source")]
    UnsupportedType(String),

    #[error("{0} can't be marked as deprecated")]
    NotDeprecatable(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },

    #[error("Invalid value for source '{name}': {reason}")]
    InvalidSource { name: String, reason: String },

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),
}

/// A panic caught while running user code or a source inside a supplier.
#[derive(Debug, Error)]
#[error("panicked: {0}")]
pub struct Panicked(pub String);

impl Panicked {
    pub(crate) fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        Panicked(msg)
    }
}

impl ConfigError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ConfigError::Retrieve(UnableToRetrieve::NotFound(msg.into()))
    }

    pub fn wrong_type(msg: impl Into<String>) -> Self {
        ConfigError::Retrieve(UnableToRetrieve::WrongType(msg.into()))
    }
}
