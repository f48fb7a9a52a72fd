#[cfg(test)]
pub mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::error::UnableToRetrieve;
    use crate::settings::{Metaconfig, MetaconfigLogger};
    use crate::supplier::Lambda;

    /// Captures every message it is given.
    #[derive(Default)]
    pub struct RecordingLogger {
        debug: Mutex<Vec<String>>,
        warn: Mutex<Vec<String>>,
        error: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        pub fn debugs(&self) -> Vec<String> {
            self.debug.lock().unwrap().clone()
        }

        pub fn warnings(&self) -> Vec<String> {
            self.warn.lock().unwrap().clone()
        }

        pub fn errors(&self) -> Vec<String> {
            self.error.lock().unwrap().clone()
        }
    }

    impl MetaconfigLogger for RecordingLogger {
        fn debug(&self, msg: &dyn Fn() -> String) {
            self.debug.lock().unwrap().push(msg());
        }

        fn warn(&self, msg: &dyn Fn() -> String) {
            self.warn.lock().unwrap().push(msg());
        }

        fn error(&self, msg: &dyn Fn() -> String) {
            self.error.lock().unwrap().push(msg());
        }
    }

    /// A context that records log output.
    pub fn recording_context() -> (Metaconfig, Arc<RecordingLogger>) {
        let logger = Arc::new(RecordingLogger::default());
        let ctx = Metaconfig::default().with_logger(logger.clone());
        (ctx, logger)
    }

    /// Counts how many times the suppliers built from it were invoked.
    #[derive(Clone, Default)]
    pub struct Counter(Arc<AtomicUsize>);

    impl Counter {
        pub fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }

        fn bump(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst)
        }

        /// A lambda that returns `value` and bumps the counter.
        pub fn returning<T: Clone + Send + Sync + 'static>(&self, value: T) -> Lambda<T> {
            let counter = self.clone();
            Lambda::new("counting", move || {
                counter.bump();
                value.clone()
            })
        }

        /// A lambda that fails with `err` and bumps the counter.
        pub fn failing<T: Send + Sync + 'static>(&self, err: UnableToRetrieve) -> Lambda<T> {
            let counter = self.clone();
            Lambda::try_new("failing", move || {
                counter.bump();
                Err::<T, _>(err.clone())
            })
        }

        /// A lambda returning the previous count, so each call yields a new value.
        pub fn sequence(&self) -> Lambda<usize> {
            let counter = self.clone();
            Lambda::new("sequence", move || counter.bump())
        }
    }

    pub fn not_found() -> UnableToRetrieve {
        UnableToRetrieve::NotFound("not found".into())
    }
}
