use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type Predicate = Arc<dyn Fn() -> Result<bool, BoxError> + Send + Sync>;

/// A named predicate gating a [`Conditional`](crate::supplier::Conditional)
/// supplier.
///
/// [`is_met`](Self::is_met) never fails: an `Err` from a fallible predicate
/// and a panic inside the predicate both count as "not met".
#[derive(Clone)]
pub struct Condition {
    context: String,
    predicate: Predicate,
}

impl Condition {
    pub fn new<F>(context: impl Into<String>, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            context: context.into(),
            predicate: Arc::new(move || Ok(predicate())),
        }
    }

    /// A condition whose predicate can fail; failure means "not met".
    pub fn try_new<F, E>(context: impl Into<String>, predicate: F) -> Self
    where
        F: Fn() -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            context: context.into(),
            predicate: Arc::new(move || predicate().map_err(Into::into)),
        }
    }

    /// A condition that always holds.
    pub fn always() -> Self {
        Self::new("always", || true)
    }

    /// Diagnostic label describing when the condition holds.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn is_met(&self) -> bool {
        matches!(
            panic::catch_unwind(AssertUnwindSafe(|| (self.predicate)())),
            Ok(Ok(true))
        )
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn true_predicate_is_met() {
        assert!(Condition::new("yes", || true).is_met());
        assert!(Condition::always().is_met());
    }

    #[test]
    fn false_predicate_is_not_met() {
        assert!(!Condition::new("no", || false).is_met());
    }

    #[test]
    fn failing_predicate_is_not_met() {
        let cond = Condition::try_new("fails", || Err::<bool, _>("backend unavailable"));
        assert!(!cond.is_met());
    }

    #[test]
    fn panicking_predicate_is_not_met() {
        let cond = Condition::new("panics", || panic!("boom"));
        assert!(!cond.is_met());
    }

    #[test]
    fn predicate_evaluated_lazily() {
        let flag = Arc::new(AtomicBool::new(false));
        let seen = flag.clone();
        let cond = Condition::new("flag set", move || seen.load(Ordering::SeqCst));
        assert!(!cond.is_met());
        flag.store(true, Ordering::SeqCst);
        assert!(cond.is_met());
    }

    #[test]
    fn context_kept() {
        assert_eq!(Condition::new("feature x on", || true).context(), "feature x on");
    }
}
