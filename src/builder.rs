use std::sync::Arc;

use crate::condition::Condition;
use crate::source::ConfigSource;
use crate::state::{Complete, lookup};
use crate::supplier::{BoxError, BoxSupplier, Conditional, Fallback, Lambda, Supplier};
use crate::value::ConfigValue;

/// Fluent builder for the chain behind one property.
///
/// Each call appends one candidate; at resolution time candidates are tried in
/// the order they were added and the first success wins.
///
/// ```ignore
/// let port = config_supplier::<i64>(|b| {
///     b.from("server.port", file.clone())
///         .retrieve(
///             lookup("port")
///                 .from(legacy.clone())
///                 .as_type()
///                 .soft_deprecated("use server.port"),
///         )
///         .compute("default", || 8080)
/// });
/// ```
pub struct SupplierBuilder<T> {
    suppliers: Vec<BoxSupplier<T>>,
}

impl<T: 'static> Default for SupplierBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> SupplierBuilder<T> {
    pub fn new() -> Self {
        Self {
            suppliers: Vec::new(),
        }
    }

    /// Append a lookup described with [`lookup`].
    pub fn retrieve(self, state: Complete<T>) -> Self {
        self.supplier_boxed(state.build())
    }

    /// Append an arbitrary supplier.
    pub fn supplier(self, supplier: impl Supplier<T> + 'static) -> Self {
        self.supplier_boxed(Box::new(supplier))
    }

    pub fn supplier_boxed(mut self, supplier: BoxSupplier<T>) -> Self {
        self.suppliers.push(supplier);
        self
    }

    /// Append a computed value, typically a default.
    pub fn compute<F>(self, context: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.supplier(Lambda::new(context, f))
    }

    pub fn try_compute<F, E>(self, context: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.supplier(Lambda::try_new(context, f))
    }

    /// Append a group of candidates that is only consulted when `condition`
    /// holds. When it doesn't, the whole property resolves to
    /// `ConditionNotMet` unless a later candidate succeeds.
    pub fn only_if(
        self,
        condition: Condition,
        block: impl FnOnce(SupplierBuilder<T>) -> SupplierBuilder<T>,
    ) -> Self {
        let inner = block(SupplierBuilder::new()).into_suppliers();
        self.supplier(Conditional::new(condition, inner))
    }

    /// [`only_if`](Self::only_if) with the condition given as a named predicate.
    pub fn only_if_fn<F>(
        self,
        context: impl Into<String>,
        predicate: F,
        block: impl FnOnce(SupplierBuilder<T>) -> SupplierBuilder<T>,
    ) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.only_if(Condition::new(context, predicate), block)
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }

    pub fn into_suppliers(self) -> Vec<BoxSupplier<T>> {
        self.suppliers
    }

    /// The single candidate if there is exactly one, else a [`Fallback`] over
    /// all of them.
    pub fn build(mut self) -> BoxSupplier<T> {
        if self.suppliers.len() == 1
            && let Some(only) = self.suppliers.pop()
        {
            return only;
        }
        Box::new(Fallback::new(self.suppliers))
    }
}

impl<T: ConfigValue> SupplierBuilder<T> {
    /// Append a lookup of `key` in `source`, retrieved directly as `T`.
    pub fn from(self, key: impl Into<String>, source: Arc<dyn ConfigSource>) -> Self {
        self.retrieve(lookup(key).from(source).as_type::<T>())
    }

    /// Like [`from`](Self::from), applying `transform` to the retrieved value.
    pub fn from_transformed<F>(
        self,
        key: impl Into<String>,
        source: Arc<dyn ConfigSource>,
        transform: F,
    ) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.retrieve(lookup(key).from(source).as_type::<T>().transformed_by(transform))
    }
}

/// Build a standalone supplier, for values that don't belong to a property.
pub fn config_supplier<T: 'static>(
    block: impl FnOnce(SupplierBuilder<T>) -> SupplierBuilder<T>,
) -> BoxSupplier<T> {
    block(SupplierBuilder::new()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnableToRetrieve;
    use crate::fixtures::test::Counter;
    use crate::map_source::MapConfigSource;
    use crate::settings::Metaconfig;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn ctx() -> Metaconfig {
        Metaconfig::default()
    }

    #[test]
    fn first_source_wins() {
        let a = Arc::new(MapConfigSource::with_values("a", [("n", 1_i64)]));
        let b = Arc::new(MapConfigSource::with_values("b", [("n", 2_i64)]));
        let supplier = config_supplier::<i64>(|s| s.from("n", a.clone()).from("n", b.clone()));
        assert_eq!(supplier.get(&ctx()).unwrap(), 1);
        a.remove("n");
        assert_eq!(supplier.get(&ctx()).unwrap(), 2);
    }

    #[test]
    fn single_candidate_is_not_wrapped() {
        let src = Arc::new(MapConfigSource::new("s"));
        let supplier = config_supplier::<bool>(|s| s.from("flag", src.clone()));
        assert!(supplier.to_string().starts_with("SourceLookup"));
    }

    #[test]
    fn several_candidates_wrapped_in_fallback() {
        let src = Arc::new(MapConfigSource::new("s"));
        let supplier =
            config_supplier::<bool>(|s| s.from("flag", src.clone()).compute("default", || true));
        assert!(supplier.to_string().starts_with("Fallback"));
        assert!(supplier.get(&ctx()).unwrap());
    }

    #[test]
    fn empty_builder_is_not_found() {
        let builder = SupplierBuilder::<i64>::new();
        assert!(builder.is_empty());
        let err = builder.build().get(&ctx()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn from_transformed_applies_function() {
        let src = Arc::new(MapConfigSource::with_values("s", [("disabled", true)]));
        let supplier =
            config_supplier::<bool>(|s| s.from_transformed("disabled", src.clone(), |b| !b));
        assert!(!supplier.get(&ctx()).unwrap());
    }

    #[test]
    fn retrieve_with_conversion() {
        let src = Arc::new(MapConfigSource::with_values("s", [("timeout_ms", 5000_i64)]));
        let supplier = config_supplier::<Duration>(|s| {
            s.retrieve(
                lookup("timeout_ms")
                    .from(src.clone())
                    .converted_by(|ms: i64| Duration::from_millis(ms as u64)),
            )
        });
        assert_eq!(supplier.get(&ctx()).unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn only_if_gates_inner_candidates() {
        let enabled = Arc::new(AtomicBool::new(false));
        let flag = enabled.clone();
        let src = Arc::new(MapConfigSource::with_values("s", [("n", 7_i64)]));
        let supplier = config_supplier::<i64>(|s| {
            s.only_if(
                Condition::new("feature enabled", move || flag.load(Ordering::SeqCst)),
                |b| b.from("n", src.clone()),
            )
        });

        let err = supplier.get(&ctx()).unwrap_err();
        assert!(matches!(err, UnableToRetrieve::ConditionNotMet(_)));
        assert!(err.to_string().contains("feature enabled"));

        enabled.store(true, Ordering::SeqCst);
        assert_eq!(supplier.get(&ctx()).unwrap(), 7);
    }

    #[test]
    fn later_candidate_after_unmet_condition() {
        let supplier = config_supplier::<i64>(|s| {
            s.only_if(Condition::new("never", || false), |b| b.compute("inner", || 1))
                .compute("default", || 2)
        });
        assert_eq!(supplier.get(&ctx()).unwrap(), 2);
    }

    #[test]
    fn only_if_fn_gates_like_only_if() {
        let enabled = Arc::new(AtomicBool::new(false));
        let flag = enabled.clone();
        let supplier = config_supplier::<i64>(|s| {
            s.only_if_fn("beta users", move || flag.load(Ordering::SeqCst), |b| {
                b.compute("beta limit", || 100)
            })
        });

        let err = supplier.get(&ctx()).unwrap_err();
        assert!(matches!(err, UnableToRetrieve::ConditionNotMet(_)));
        assert!(err.to_string().contains("beta users"));

        enabled.store(true, Ordering::SeqCst);
        assert_eq!(supplier.get(&ctx()).unwrap(), 100);
    }

    #[test]
    fn try_compute_error_is_wrapped() {
        let supplier = config_supplier::<i64>(|s| s.try_compute("parse", || "x".parse::<i64>()));
        assert!(matches!(
            supplier.get(&ctx()).unwrap_err(),
            UnableToRetrieve::Error(_)
        ));
    }

    #[test]
    fn compute_not_called_when_earlier_candidate_succeeds() {
        let counter = Counter::default();
        let src = Arc::new(MapConfigSource::with_values("s", [("n", 1_i64)]));
        let supplier = config_supplier::<i64>(|s| {
            s.from("n", src.clone()).supplier(counter.returning(2_i64))
        });
        assert_eq!(supplier.get(&ctx()).unwrap(), 1);
        assert_eq!(counter.count(), 0);
    }
}
