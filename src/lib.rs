//! Declarative, typed configuration properties for Rust applications. Say
//! where a value may come from, in priority order, and read it.
//!
//! Metaconfig resolves one property at a time through a chain of retrieval
//! strategies: look a key up in a source, fall back to a legacy key, convert a
//! millisecond count into a [`Duration`](std::time::Duration), gate the whole
//! thing on a feature flag, end with a computed default. The chain is built
//! once when the property is declared and evaluated when it is read.
//!
//! ```ignore
//! let ctx = Metaconfig::from_env()?;
//! let file: Arc<dyn ConfigSource> = Arc::new(TomlConfigSource::from_file("app", "app.toml")?);
//! let env: Arc<dyn ConfigSource> = Arc::new(EnvConfigSource::from_env("MYAPP"));
//!
//! let timeout = ctx.config::<Duration>(|b| {
//!     b.from("server.timeout", env.clone())
//!         .from("server.timeout", file.clone())
//!         .retrieve(
//!             lookup("timeout_ms")
//!                 .from(file.clone())
//!                 .converted_by(|ms: i64| Duration::from_millis(ms as u64))
//!                 .soft_deprecated("use server.timeout"),
//!         )
//!         .compute("default", || Duration::from_secs(30))
//! });
//!
//! let value: Duration = timeout.get()?;
//! ```
//!
//! # Sources
//!
//! A [`ConfigSource`] is the only boundary to where values live. It is asked
//! for a getter of a specific [`ValueKind`] and the getter then looks up keys.
//! Three sources ship with the crate:
//!
//! - **[`MapConfigSource`]**: an in-memory map that can be changed after
//!   properties are declared. Chains see the changes on their next
//!   resolution. Useful for tests and for values computed at runtime.
//! - **[`TomlConfigSource`]**: a TOML table addressed by dotted keys, read
//!   from a string, a file, or any `Serialize` value.
//! - **[`EnvConfigSource`]**: `PREFIX__A__B` environment variables served as
//!   key `a.b`.
//!
//! Supported value kinds are a closed set: `bool`, `i32`, `i64`, `f64`,
//! `String`, `Duration` and `Vec<String>` (see [`ConfigValue`]). A source
//! that can never produce a kind says so with
//! [`ConfigError::UnsupportedType`].
//!
//! # Resolution
//!
//! The chain is a tree of [`Supplier`]s:
//!
//! | Supplier | Behaviour |
//! |----------|-----------|
//! | [`SourceLookup`] | reads a key from a source, honouring deprecation |
//! | [`ValueTransform`] | applies a same-type function |
//! | [`TypeConvert`] | applies a function to another type |
//! | [`Fallback`] | first success wins, in declared order |
//! | [`Conditional`] | only consults its children when a [`Condition`] holds |
//! | [`Lambda`] | computes a value |
//!
//! Order is a contract: a [`Fallback`] never evaluates a later candidate once
//! an earlier one succeeded, and a hard-deprecated key stops the search
//! instead of falling through to an alternate.
//!
//! # Deprecation
//!
//! A lookup can be soft-deprecated (the value is returned and a warning is
//! logged the first time that lookup succeeds) or hard-deprecated (a found
//! value is discarded and resolution fails with
//! [`UnableToRetrieve::Deprecated`]). Deprecation is attached to the lookup
//! itself, so it takes effect however many transformations are stacked on
//! top of it.
//!
//! # Errors
//!
//! Every resolution failure is an [`UnableToRetrieve`]: `NotFound`,
//! `WrongType`, `Deprecated`, `ConditionNotMet`, or `Error` wrapping anything
//! else (an `Err` or a panic from a user closure, an I/O failure inside a
//! source). Construction-time failures, such as a TOML file that doesn't
//! parse, are [`ConfigError`]s.
//!
//! # Properties
//!
//! [`Metaconfig::config`] declares a required [`Property`];
//! [`Metaconfig::optional_config`] declares an [`OptionalProperty`], which
//! reads as `None` for every failure except `ConditionNotMet`.
//!
//! By default a property resolves on first read and keeps the outcome,
//! success or failure, from then on. [`MetaconfigSettings`] can turn caching
//! off or make properties resolve at declaration. Both exist for tests;
//! production code should leave them alone.
//!
//! # Logging
//!
//! Diagnostics go to the [`MetaconfigLogger`] held by the [`Metaconfig`]
//! context. The default discards everything; [`TracingLogger`] forwards to
//! `tracing` under the `metaconfig` target.

pub mod error;

mod builder;
mod condition;
mod deprecation;
mod env;
mod map_source;
mod property;
mod settings;
mod source;
mod state;
mod supplier;
mod toml_source;
mod value;

#[cfg(test)]
mod fixtures;

pub use builder::{SupplierBuilder, config_supplier};
pub use condition::Condition;
pub use deprecation::Deprecation;
pub use env::EnvConfigSource;
pub use error::{ConfigError, UnableToRetrieve};
pub use map_source::MapConfigSource;
pub use property::{OptionalProperty, Property};
pub use settings::{Metaconfig, MetaconfigLogger, MetaconfigSettings, NoOpLogger, TracingLogger};
pub use source::{ConfigSource, Getter};
pub use state::{Complete, KeyAndSource, KeyOnly, lookup};
pub use supplier::{
    BoxSupplier, Conditional, Fallback, Lambda, SourceLookup, Supplier, TypeConvert,
    ValueTransform,
};
pub use toml_source::TomlConfigSource;
pub use value::{ConfigValue, Value, ValueKind};
