//! Property handles: the accessor application code holds for one declared
//! value.
//!
//! With caching enabled (the default) a handle resolves its chain once and
//! keeps the outcome, success or failure, for its whole lifetime. Concurrent
//! first accesses block on the same evaluation rather than racing. With
//! caching disabled every access runs the full chain again.

use std::fmt;
use std::sync::OnceLock;

use crate::builder::SupplierBuilder;
use crate::error::UnableToRetrieve;
use crate::settings::Metaconfig;
use crate::state::Complete;
use crate::supplier::{BoxSupplier, Supplier};

/// A required property. Resolution failures are returned as errors.
pub struct Property<T> {
    ctx: Metaconfig,
    supplier: BoxSupplier<T>,
    slot: OnceLock<Result<T, UnableToRetrieve>>,
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Wrap `supplier`. If the context asks for immediate retrieval, the chain
    /// is resolved here.
    pub fn new(ctx: Metaconfig, supplier: BoxSupplier<T>) -> Self {
        let property = Self {
            ctx,
            supplier,
            slot: OnceLock::new(),
        };
        if property.ctx.settings().retrieve_values_immediately {
            let outcome = property.resolve();
            if property.ctx.settings().cache_enabled {
                let _ = property.slot.set(outcome);
            }
        }
        property
    }

    pub fn get(&self) -> Result<T, UnableToRetrieve> {
        if !self.ctx.settings().cache_enabled {
            return self.resolve();
        }
        self.slot.get_or_init(|| self.resolve()).clone()
    }

    /// Whether an outcome has been cached.
    pub fn is_evaluated(&self) -> bool {
        self.slot.get().is_some()
    }

    pub fn supplier(&self) -> &dyn Supplier<T> {
        self.supplier.as_ref()
    }

    fn resolve(&self) -> Result<T, UnableToRetrieve> {
        self.supplier.get(&self.ctx).inspect_err(|e| {
            self.ctx
                .logger()
                .debug(&|| format!("Property: unable to resolve from {}: {e}", self.supplier));
        })
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("supplier", &self.supplier.to_string())
            .field("evaluated", &self.slot.get().is_some())
            .finish()
    }
}

/// A property that may legitimately be absent.
///
/// Every failure except `ConditionNotMet` resolves to `None`. A property gated
/// on a condition that doesn't hold is a usage error, not absence, so that one
/// is still returned as an error.
pub struct OptionalProperty<T> {
    inner: Property<T>,
}

impl<T: Clone + Send + Sync + 'static> OptionalProperty<T> {
    pub fn new(ctx: Metaconfig, supplier: BoxSupplier<T>) -> Self {
        Self {
            inner: Property::new(ctx, supplier),
        }
    }

    pub fn get(&self) -> Result<Option<T>, UnableToRetrieve> {
        match self.inner.get() {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_condition_not_met() => Err(e),
            Err(_) => Ok(None),
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.inner.is_evaluated()
    }
}

impl<T> fmt::Debug for OptionalProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OptionalProperty").field(&self.inner).finish()
    }
}

impl Metaconfig {
    /// Declare a required property from the candidates added in `block`.
    pub fn config<T: Clone + Send + Sync + 'static>(
        &self,
        block: impl FnOnce(SupplierBuilder<T>) -> SupplierBuilder<T>,
    ) -> Property<T> {
        Property::new(self.clone(), block(SupplierBuilder::new()).build())
    }

    pub fn optional_config<T: Clone + Send + Sync + 'static>(
        &self,
        block: impl FnOnce(SupplierBuilder<T>) -> SupplierBuilder<T>,
    ) -> OptionalProperty<T> {
        OptionalProperty::new(self.clone(), block(SupplierBuilder::new()).build())
    }

    /// Declare a required property backed by a single lookup.
    pub fn config_lookup<T: Clone + Send + Sync + 'static>(
        &self,
        state: Complete<T>,
    ) -> Property<T> {
        Property::new(self.clone(), state.build())
    }

    pub fn optional_lookup<T: Clone + Send + Sync + 'static>(
        &self,
        state: Complete<T>,
    ) -> OptionalProperty<T> {
        OptionalProperty::new(self.clone(), state.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::fixtures::test::{Counter, not_found};
    use crate::map_source::MapConfigSource;
    use crate::state::lookup;
    use std::sync::Arc;
    use std::thread;

    fn uncached() -> Metaconfig {
        Metaconfig::default().with_cache_enabled(false)
    }

    #[test]
    fn cached_success_evaluated_once() {
        let counter = Counter::default();
        let property =
            Metaconfig::default().config::<i64>(|b| b.supplier(counter.returning(42_i64)));
        assert!(!property.is_evaluated());
        for _ in 0..3 {
            assert_eq!(property.get().unwrap(), 42);
        }
        assert_eq!(counter.count(), 1);
        assert!(property.is_evaluated());
    }

    #[test]
    fn cached_failure_evaluated_once() {
        let counter = Counter::default();
        let property =
            Metaconfig::default().config::<i64>(|b| b.supplier(counter.failing(not_found())));
        for _ in 0..3 {
            assert!(property.get().unwrap_err().is_not_found());
        }
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn cached_optional_failure_evaluated_once() {
        let counter = Counter::default();
        let property = Metaconfig::default()
            .optional_config::<i64>(|b| b.supplier(counter.failing(not_found())));
        for _ in 0..3 {
            assert_eq!(property.get().unwrap(), None);
        }
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn uncached_evaluates_every_access() {
        let counter = Counter::default();
        let property = uncached().config::<i64>(|b| b.supplier(counter.failing(not_found())));
        for _ in 0..3 {
            assert!(property.get().is_err());
        }
        assert_eq!(counter.count(), 3);

        let counter = Counter::default();
        let property =
            uncached().optional_config::<i64>(|b| b.supplier(counter.failing(not_found())));
        for _ in 0..3 {
            assert_eq!(property.get().unwrap(), None);
        }
        assert_eq!(counter.count(), 3);
        assert!(!property.is_evaluated());
    }

    #[test]
    fn uncached_sees_each_new_value() {
        let counter = Counter::default();
        let property = uncached().config::<usize>(|b| b.supplier(counter.sequence()));
        assert_eq!(property.get().unwrap(), 0);
        assert_eq!(property.get().unwrap(), 1);
    }

    #[test]
    fn cached_value_ignores_source_changes() {
        let src = Arc::new(MapConfigSource::with_values("s", [("n", 1_i64)]));
        let property =
            Metaconfig::default().config_lookup(lookup("n").from(src.clone()).as_type::<i64>());
        assert_eq!(property.get().unwrap(), 1);
        src.insert("n", 2_i64);
        assert_eq!(property.get().unwrap(), 1);
    }

    #[test]
    fn concurrent_first_access_evaluates_once() {
        let counter = Counter::default();
        let property = Metaconfig::default().config::<usize>(|b| b.supplier(counter.sequence()));
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| assert_eq!(property.get().unwrap(), 0));
            }
        });
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn immediate_retrieval_at_declaration() {
        let counter = Counter::default();
        let ctx = Metaconfig::default().with_retrieve_values_immediately(true);
        let property = ctx.config::<i64>(|b| b.supplier(counter.returning(5_i64)));
        assert_eq!(counter.count(), 1);
        assert!(property.is_evaluated());
        assert_eq!(property.get().unwrap(), 5);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn immediate_retrieval_keeps_failure_until_access() {
        let counter = Counter::default();
        let ctx = Metaconfig::default().with_retrieve_values_immediately(true);
        let property = ctx.config::<i64>(|b| b.supplier(counter.failing(not_found())));
        assert_eq!(counter.count(), 1);
        assert!(property.get().is_err());
    }

    #[test]
    fn optional_passes_condition_not_met_through() {
        let property = Metaconfig::default().optional_config::<i64>(|b| {
            b.only_if(Condition::new("never", || false), |b| b.compute("v", || 1))
        });
        assert!(matches!(
            property.get().unwrap_err(),
            UnableToRetrieve::ConditionNotMet(_)
        ));
    }

    #[test]
    fn optional_absent_for_wrong_type() {
        let src = Arc::new(MapConfigSource::with_values("s", [("n", "text")]));
        let property =
            Metaconfig::default().optional_lookup(lookup("n").from(src).as_type::<i64>());
        assert_eq!(property.get().unwrap(), None);
    }

    #[test]
    fn optional_present() {
        let src = Arc::new(MapConfigSource::with_values("s", [("name", "svc")]));
        let property =
            Metaconfig::default().optional_lookup(lookup("name").from(src).as_type::<String>());
        assert_eq!(property.get().unwrap(), Some("svc".to_string()));
    }

    #[test]
    fn required_hard_deprecated_fails() {
        let src = Arc::new(MapConfigSource::with_values("s", [("old", 42_i64)]));
        let property = Metaconfig::default().config_lookup(
            lookup("old")
                .from(src)
                .as_type::<i64>()
                .hard_deprecated("use new"),
        );
        assert!(property.get().unwrap_err().is_deprecated());
    }
}
