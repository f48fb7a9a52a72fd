//! Piece-by-piece construction of a source lookup.
//!
//! A lookup is only buildable once it has a key, a source and a type:
//!
//! ```text
//! lookup(key) ─► KeyOnly ─from(source)─► KeyAndSource ─as_type::<T>()─► Complete<T>
//! ```
//!
//! A [`Complete`] can then be transformed, converted to another type, or marked
//! deprecated, in any order. Deprecation always lands on the underlying
//! [`SourceLookup`], never on the stages wrapped around it.

use std::sync::Arc;

use crate::deprecation::Deprecation;
use crate::source::ConfigSource;
use crate::supplier::{
    BoxError, BoxSupplier, ConvertFn, SourceLookup, TransformFn, TypeConvert, ValueTransform,
};
use crate::value::ConfigValue;

/// Start describing a lookup of `key`.
pub fn lookup(key: impl Into<String>) -> KeyOnly {
    KeyOnly { key: key.into() }
}

/// Only the key is known.
#[derive(Debug, Clone)]
pub struct KeyOnly {
    key: String,
}

impl KeyOnly {
    pub fn from(self, source: Arc<dyn ConfigSource>) -> KeyAndSource {
        KeyAndSource {
            key: self.key,
            source,
            deprecation: Deprecation::NotDeprecated,
        }
    }
}

/// Key and source are known; the type is not.
#[derive(Clone)]
pub struct KeyAndSource {
    key: String,
    source: Arc<dyn ConfigSource>,
    deprecation: Deprecation,
}

impl KeyAndSource {
    pub fn as_type<T: ConfigValue>(self) -> Complete<T> {
        let KeyAndSource {
            key,
            source,
            deprecation,
        } = self;
        Complete {
            deprecation,
            make: Arc::new(move |deprecation: Deprecation| -> BoxSupplier<T> {
                let leaf = SourceLookup::<T>::new(key.clone(), source.clone());
                Box::new(leaf.deprecated(deprecation))
            }),
        }
    }

    /// Retrieve as `R` and convert to `T`.
    pub fn converted_by<R, T, F>(self, convert: F) -> Complete<T>
    where
        R: ConfigValue,
        T: 'static,
        F: Fn(R) -> T + Send + Sync + 'static,
    {
        self.as_type::<R>().converted_by(convert)
    }

    pub fn try_converted_by<R, T, F, E>(self, convert: F) -> Complete<T>
    where
        R: ConfigValue,
        T: 'static,
        F: Fn(R) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.as_type::<R>().try_converted_by(convert)
    }

    pub fn soft_deprecated(mut self, msg: impl Into<String>) -> Self {
        self.deprecation = Deprecation::soft(msg);
        self
    }

    pub fn hard_deprecated(mut self, msg: impl Into<String>) -> Self {
        self.deprecation = Deprecation::hard(msg);
        self
    }
}

type MakeFn<T> = Arc<dyn Fn(Deprecation) -> BoxSupplier<T> + Send + Sync>;

/// A fully specified lookup, possibly with transformation stages on top.
pub struct Complete<T> {
    deprecation: Deprecation,
    make: MakeFn<T>,
}

impl<T: 'static> Complete<T> {
    pub fn transformed_by<F>(self, transform: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.try_transformed_by(move |v| Ok::<T, BoxError>(transform(v)))
    }

    pub fn try_transformed_by<F, E>(self, transform: F) -> Self
    where
        F: Fn(T) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let inner = self.make;
        let transform: TransformFn<T> =
            Arc::new(move |v| transform(v).map_err(Into::into));
        Complete {
            deprecation: self.deprecation,
            make: Arc::new(move |deprecation: Deprecation| -> BoxSupplier<T> {
                Box::new(ValueTransform::from_parts(inner(deprecation), transform.clone()))
            }),
        }
    }

    pub fn converted_by<U, F>(self, convert: F) -> Complete<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_converted_by(move |v| Ok::<U, BoxError>(convert(v)))
    }

    pub fn try_converted_by<U, F, E>(self, convert: F) -> Complete<U>
    where
        U: 'static,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let inner = self.make;
        let convert: ConvertFn<T, U> =
            Arc::new(move |v| convert(v).map_err(Into::into));
        Complete {
            deprecation: self.deprecation,
            make: Arc::new(move |deprecation: Deprecation| -> BoxSupplier<U> {
                Box::new(TypeConvert::from_parts(inner(deprecation), convert.clone()))
            }),
        }
    }

    pub fn soft_deprecated(self, msg: impl Into<String>) -> Self {
        self.with_deprecation(Deprecation::soft(msg))
    }

    pub fn hard_deprecated(self, msg: impl Into<String>) -> Self {
        self.with_deprecation(Deprecation::hard(msg))
    }

    pub fn with_deprecation(mut self, deprecation: Deprecation) -> Self {
        self.deprecation = deprecation;
        self
    }

    pub fn deprecation(&self) -> &Deprecation {
        &self.deprecation
    }

    pub fn build(self) -> BoxSupplier<T> {
        (self.make)(self.deprecation)
    }
}
