//! The supplier chain: composable strategies for retrieving one property.
//!
//! A chain is a tree of [`Supplier`]s built once and evaluated on every
//! resolution. Leaves are [`SourceLookup`]s (reading a key from a
//! [`ConfigSource`]) and [`Lambda`]s (computing a value). Inner nodes
//! transform ([`ValueTransform`]), convert ([`TypeConvert`]), pick the first
//! success ([`Fallback`]) or gate on a predicate ([`Conditional`]).
//!
//! Every failure leaving a supplier is an [`UnableToRetrieve`]. Errors returned
//! by user closures or sources are wrapped as `UnableToRetrieve::Error` unless
//! they already are a retrieval failure, and panics are caught and wrapped the
//! same way.

use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::condition::Condition;
use crate::deprecation::Deprecation;
use crate::error::{ConfigError, Panicked, UnableToRetrieve};
use crate::settings::Metaconfig;
use crate::source::ConfigSource;
use crate::value::ConfigValue;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type BoxSupplier<T> = Box<dyn Supplier<T>>;

/// A strategy for producing a value of type `T`.
pub trait Supplier<T>: fmt::Display + Send + Sync {
    /// Resolve the value. Recomputed on every call; caching belongs to the
    /// property layer.
    fn get(&self, ctx: &Metaconfig) -> Result<T, UnableToRetrieve>;

    /// A copy of this chain with `deprecation` applied to the lookup that owns
    /// the retrieval. Fails for suppliers that have no single retrieval point.
    fn with_deprecation(&self, deprecation: Deprecation) -> Result<BoxSupplier<T>, ConfigError>;
}

/// Map an error produced outside the pipeline onto a retrieval failure,
/// keeping retrieval failures as they are.
pub(crate) fn into_retrieve(err: BoxError) -> UnableToRetrieve {
    match err.downcast::<UnableToRetrieve>() {
        Ok(e) => *e,
        Err(err) => match err.downcast::<ConfigError>() {
            Ok(e) => config_to_retrieve(*e),
            Err(err) => UnableToRetrieve::Error(Arc::from(err)),
        },
    }
}

fn config_to_retrieve(err: ConfigError) -> UnableToRetrieve {
    match err {
        ConfigError::Retrieve(e) => e,
        other => UnableToRetrieve::error(other),
    }
}

/// Run `f`, converting its error and any panic into an [`UnableToRetrieve`].
fn guarded<R>(f: impl FnOnce() -> Result<R, BoxError>) -> Result<R, UnableToRetrieve> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(into_retrieve),
        Err(payload) => Err(UnableToRetrieve::error(Panicked::from_payload(payload))),
    }
}

// -- SourceLookup -------------------------------------------------------------

/// Reads `key` from `source` as `T`.
///
/// A soft deprecation logs a warning on the first successful retrieval of this
/// instance only. A hard deprecation discards a successfully retrieved value and
/// fails with `Deprecated`.
pub struct SourceLookup<T> {
    key: String,
    source: Arc<dyn ConfigSource>,
    deprecation: Deprecation,
    warned: AtomicBool,
    _type: PhantomData<fn() -> T>,
}

impl<T: ConfigValue> SourceLookup<T> {
    pub fn new(key: impl Into<String>, source: Arc<dyn ConfigSource>) -> Self {
        Self::with(key.into(), source, Deprecation::NotDeprecated)
    }

    fn with(key: String, source: Arc<dyn ConfigSource>, deprecation: Deprecation) -> Self {
        Self {
            key,
            source,
            deprecation,
            warned: AtomicBool::new(false),
            _type: PhantomData,
        }
    }

    pub fn deprecated(self, deprecation: Deprecation) -> Self {
        Self::with(self.key, self.source, deprecation)
    }

    /// The same key, source and deprecation, retrieved as `U` instead.
    pub fn retrieved_as<U: ConfigValue>(&self) -> SourceLookup<U> {
        SourceLookup::with(self.key.clone(), self.source.clone(), self.deprecation.clone())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn deprecation(&self) -> &Deprecation {
        &self.deprecation
    }

    fn retrieve(&self) -> Result<T, BoxError> {
        let getter = self.source.getter_for(T::KIND)?;
        let value = getter(self.key.as_str())?;
        let found = value.kind();
        T::from_value(value).ok_or_else(|| {
            ConfigError::wrong_type(format!(
                "expected type {}, got type {found} for key '{}' in source '{}'",
                T::KIND,
                self.key,
                self.source.name()
            ))
            .into()
        })
    }

    fn deprecation_message(&self, msg: &str) -> String {
        format!(
            "Key '{}' from source '{}' is deprecated: {msg}",
            self.key,
            self.source.name()
        )
    }
}

impl<T: ConfigValue> Supplier<T> for SourceLookup<T> {
    fn get(&self, ctx: &Metaconfig) -> Result<T, UnableToRetrieve> {
        ctx.logger().debug(&|| format!("{self}: trying to retrieve"));
        let value = guarded(|| self.retrieve()).inspect_err(|e| {
            ctx.logger().debug(&|| format!("{self}: failed to retrieve: {e}"));
        })?;
        ctx.logger().debug(&|| format!("{self}: successfully retrieved"));

        match &self.deprecation {
            Deprecation::NotDeprecated => Ok(value),
            Deprecation::Soft(msg) => {
                if !self.warned.swap(true, Ordering::SeqCst) {
                    ctx.logger().warn(&|| self.deprecation_message(msg));
                }
                Ok(value)
            }
            Deprecation::Hard(msg) => Err(UnableToRetrieve::Deprecated(
                self.deprecation_message(msg),
            )),
        }
    }

    fn with_deprecation(&self, deprecation: Deprecation) -> Result<BoxSupplier<T>, ConfigError> {
        Ok(Box::new(SourceLookup::<T>::with(
            self.key.clone(),
            self.source.clone(),
            deprecation,
        )))
    }
}

impl<T: ConfigValue> fmt::Display for SourceLookup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceLookup: key '{}', type {}, source '{}'",
            self.key,
            T::KIND,
            self.source.name()
        )
    }
}

// -- ValueTransform -----------------------------------------------------------

pub(crate) type TransformFn<T> = Arc<dyn Fn(T) -> Result<T, BoxError> + Send + Sync>;

/// Applies a same-type function to the value of an inner supplier.
pub struct ValueTransform<T> {
    inner: BoxSupplier<T>,
    transform: TransformFn<T>,
}

impl<T: 'static> ValueTransform<T> {
    pub(crate) fn from_parts(inner: BoxSupplier<T>, transform: TransformFn<T>) -> Self {
        Self { inner, transform }
    }

    pub fn new<F>(inner: BoxSupplier<T>, transform: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        Self {
            inner,
            transform: Arc::new(move |v| Ok(transform(v))),
        }
    }

    /// Like [`new`](Self::new), for a transformation that can fail.
    pub fn try_new<F, E>(inner: BoxSupplier<T>, transform: F) -> Self
    where
        F: Fn(T) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            inner,
            transform: Arc::new(move |v| transform(v).map_err(Into::into)),
        }
    }
}

impl<T: 'static> Supplier<T> for ValueTransform<T> {
    fn get(&self, ctx: &Metaconfig) -> Result<T, UnableToRetrieve> {
        let original = self.inner.get(ctx)?;
        let value = guarded(|| (self.transform)(original))?;
        ctx.logger()
            .debug(&|| format!("ValueTransform: transformed value from {}", self.inner));
        Ok(value)
    }

    fn with_deprecation(&self, deprecation: Deprecation) -> Result<BoxSupplier<T>, ConfigError> {
        Ok(Box::new(ValueTransform {
            inner: self.inner.with_deprecation(deprecation)?,
            transform: self.transform.clone(),
        }))
    }
}

impl<T> fmt::Display for ValueTransform<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueTransform: transforming value from {}", self.inner)
    }
}

// -- TypeConvert --------------------------------------------------------------

pub(crate) type ConvertFn<A, B> = Arc<dyn Fn(A) -> Result<B, BoxError> + Send + Sync>;

/// Converts the value of an inner supplier from `A` to `B`.
pub struct TypeConvert<A, B> {
    inner: BoxSupplier<A>,
    convert: ConvertFn<A, B>,
}

impl<A: 'static, B: 'static> TypeConvert<A, B> {
    pub(crate) fn from_parts(inner: BoxSupplier<A>, convert: ConvertFn<A, B>) -> Self {
        Self { inner, convert }
    }

    pub fn new<F>(inner: BoxSupplier<A>, convert: F) -> Self
    where
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        Self {
            inner,
            convert: Arc::new(move |v| Ok(convert(v))),
        }
    }

    pub fn try_new<F, E>(inner: BoxSupplier<A>, convert: F) -> Self
    where
        F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            inner,
            convert: Arc::new(move |v| convert(v).map_err(Into::into)),
        }
    }
}

impl<A: 'static, B: 'static> Supplier<B> for TypeConvert<A, B> {
    fn get(&self, ctx: &Metaconfig) -> Result<B, UnableToRetrieve> {
        let original = self.inner.get(ctx)?;
        let value = guarded(|| (self.convert)(original))?;
        ctx.logger()
            .debug(&|| format!("TypeConvert: converted value type from {}", self.inner));
        Ok(value)
    }

    fn with_deprecation(&self, deprecation: Deprecation) -> Result<BoxSupplier<B>, ConfigError> {
        Ok(Box::new(TypeConvert {
            inner: self.inner.with_deprecation(deprecation)?,
            convert: self.convert.clone(),
        }))
    }
}

impl<A, B> fmt::Display for TypeConvert<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeConvert: converting value from {}", self.inner)
    }
}

// -- Fallback -----------------------------------------------------------------

/// Tries each supplier in order and returns the first success.
///
/// A `Deprecated` failure stops the search immediately: a hard-deprecated key
/// must fail loudly even if a later supplier has a value. If every supplier
/// fails, the result is `NotFound` with every individual failure in its message.
pub struct Fallback<T> {
    suppliers: Vec<BoxSupplier<T>>,
}

impl<T> Fallback<T> {
    pub fn new(suppliers: Vec<BoxSupplier<T>>) -> Self {
        Self { suppliers }
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }
}

impl<T> Supplier<T> for Fallback<T> {
    fn get(&self, ctx: &Metaconfig) -> Result<T, UnableToRetrieve> {
        ctx.logger().debug(&|| format!("{self}"));
        let mut failures = Vec::new();
        for supplier in &self.suppliers {
            match supplier.get(ctx) {
                Ok(value) => {
                    ctx.logger()
                        .debug(&|| format!("Fallback: value found via {supplier}"));
                    return Ok(value);
                }
                Err(e) if e.is_deprecated() => return Err(e),
                Err(e) => {
                    ctx.logger()
                        .debug(&|| format!("Fallback: failed to find value via {supplier}: {e}"));
                    failures.push(e);
                }
            }
        }
        let details: String = failures
            .iter()
            .map(|e| format!("\n  {}: {e}", e.kind()))
            .collect();
        Err(UnableToRetrieve::NotFound(format!(
            "No suppliers found a value:{details}"
        )))
    }

    fn with_deprecation(&self, _deprecation: Deprecation) -> Result<BoxSupplier<T>, ConfigError> {
        Err(ConfigError::NotDeprecatable("Fallback".into()))
    }
}

impl<T> fmt::Display for Fallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fallback: checking suppliers:")?;
        for supplier in &self.suppliers {
            write!(f, "\n  {supplier}")?;
        }
        Ok(())
    }
}

// -- Conditional --------------------------------------------------------------

/// Searches its suppliers in order, but only if `condition` is met.
pub struct Conditional<T> {
    condition: Condition,
    inner: Fallback<T>,
}

impl<T> Conditional<T> {
    pub fn new(condition: Condition, suppliers: Vec<BoxSupplier<T>>) -> Self {
        Self {
            condition,
            inner: Fallback::new(suppliers),
        }
    }
}

impl<T> Supplier<T> for Conditional<T> {
    fn get(&self, ctx: &Metaconfig) -> Result<T, UnableToRetrieve> {
        if self.condition.is_met() {
            self.inner.get(ctx)
        } else {
            ctx.logger().debug(&|| {
                format!("Conditional: condition '{}' not met", self.condition.context())
            });
            Err(UnableToRetrieve::ConditionNotMet(format!(
                "Property only enabled when: {}",
                self.condition.context()
            )))
        }
    }

    fn with_deprecation(&self, _deprecation: Deprecation) -> Result<BoxSupplier<T>, ConfigError> {
        Err(ConfigError::NotDeprecatable("Conditional".into()))
    }
}

impl<T> fmt::Display for Conditional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conditional: enabled only when {}: {}",
            self.condition.context(),
            self.inner
        )
    }
}

// -- Lambda -------------------------------------------------------------------

type LambdaFn<T> = Arc<dyn Fn() -> Result<T, BoxError> + Send + Sync>;

/// Produces a value by calling a closure; used for defaults and computed values.
pub struct Lambda<T> {
    context: String,
    body: LambdaFn<T>,
}

impl<T: 'static> Lambda<T> {
    pub fn new<F>(context: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            context: context.into(),
            body: Arc::new(move || Ok(body())),
        }
    }

    pub fn try_new<F, E>(context: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            context: context.into(),
            body: Arc::new(move || body().map_err(Into::into)),
        }
    }
}

impl<T: 'static> Supplier<T> for Lambda<T> {
    fn get(&self, ctx: &Metaconfig) -> Result<T, UnableToRetrieve> {
        ctx.logger().debug(&|| format!("{self}: trying to retrieve value"));
        let value = guarded(|| (self.body)())?;
        ctx.logger().debug(&|| format!("{self}: found value"));
        Ok(value)
    }

    fn with_deprecation(&self, _deprecation: Deprecation) -> Result<BoxSupplier<T>, ConfigError> {
        Err(ConfigError::NotDeprecatable(self.to_string()))
    }
}

impl<T> fmt::Display for Lambda<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.trim().is_empty() {
            write!(f, "Lambda")
        } else {
            write!(f, "Lambda: '{}'", self.context)
        }
    }
}
