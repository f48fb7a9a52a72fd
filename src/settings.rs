//! Resolution context: settings and the logging sink.
//!
//! Nothing here is global. A [`Metaconfig`] is created by the application (or
//! a test) and handed to every property it declares; suppliers receive it on
//! each [`get`](crate::Supplier::get).

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use confique::Config;

use crate::error::ConfigError;

/// Knobs consulted by the property layer.
///
/// Both are intended for tests: production code should leave the defaults.
#[derive(Config, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaconfigSettings {
    /// Cache the outcome of a property's first resolution. When disabled, every
    /// access re-runs the full supplier chain.
    #[config(default = true, env = "METACONFIG_CACHE_ENABLED")]
    pub cache_enabled: bool,

    /// Resolve properties when they are declared rather than on first access.
    #[config(default = false, env = "METACONFIG_RETRIEVE_VALUES_IMMEDIATELY")]
    pub retrieve_values_immediately: bool,
}

impl Default for MetaconfigSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            retrieve_values_immediately: false,
        }
    }
}

impl MetaconfigSettings {
    /// Load from `METACONFIG_*` environment variables, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::builder().env().load()?)
    }

    /// Load from a TOML file, with environment variables taking precedence.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::builder().env().file(path.as_ref()).load()?)
    }
}

/// Sink for the library's diagnostics.
///
/// Messages are passed as closures so they are only built if the sink records
/// them.
pub trait MetaconfigLogger: Send + Sync {
    fn debug(&self, msg: &dyn Fn() -> String);
    fn warn(&self, msg: &dyn Fn() -> String);
    fn error(&self, msg: &dyn Fn() -> String);
}

/// Discards everything. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpLogger;

impl MetaconfigLogger for NoOpLogger {
    fn debug(&self, _msg: &dyn Fn() -> String) {}
    fn warn(&self, _msg: &dyn Fn() -> String) {}
    fn error(&self, _msg: &dyn Fn() -> String) {}
}

/// Forwards to `tracing` under the `metaconfig` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl MetaconfigLogger for TracingLogger {
    fn debug(&self, msg: &dyn Fn() -> String) {
        tracing::debug!(target: "metaconfig", "{}", msg());
    }

    fn warn(&self, msg: &dyn Fn() -> String) {
        tracing::warn!(target: "metaconfig", "{}", msg());
    }

    fn error(&self, msg: &dyn Fn() -> String) {
        tracing::error!(target: "metaconfig", "{}", msg());
    }
}

/// Settings plus logger, threaded through property construction and
/// resolution. Cheap to clone.
#[derive(Clone)]
pub struct Metaconfig {
    settings: MetaconfigSettings,
    logger: Arc<dyn MetaconfigLogger>,
}

impl Default for Metaconfig {
    fn default() -> Self {
        Self::new(MetaconfigSettings::default())
    }
}

impl Metaconfig {
    pub fn new(settings: MetaconfigSettings) -> Self {
        Self {
            settings,
            logger: Arc::new(NoOpLogger),
        }
    }

    /// Settings from the environment and a [`TracingLogger`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(MetaconfigSettings::load()?).with_logger(Arc::new(TracingLogger)))
    }

    pub fn with_logger(mut self, logger: Arc<dyn MetaconfigLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.settings.cache_enabled = enabled;
        self
    }

    pub fn with_retrieve_values_immediately(mut self, immediately: bool) -> Self {
        self.settings.retrieve_values_immediately = immediately;
        self
    }

    pub fn settings(&self) -> &MetaconfigSettings {
        &self.settings
    }

    pub fn logger(&self) -> &dyn MetaconfigLogger {
        self.logger.as_ref()
    }
}

impl fmt::Debug for Metaconfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metaconfig")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
