use std::sync::{Arc, Mutex, OnceLock, PoisonError, TryLockError};

use log::debug;

use super::Lemmatizer;
use crate::{Config, Error, Result};

/// Lifecycle of a [`SessionCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
}

/// A lazily loaded, shared instance.
///
/// The first caller runs the loader while concurrent callers wait for it; all
/// of them receive the same instance. A failed load leaves the cell empty, so
/// a later call tries again.
pub struct SessionCell<T> {
    instance: OnceLock<Arc<T>>,
    init: Mutex<()>,
}

impl<T> SessionCell<T> {
    pub const fn new() -> Self {
        SessionCell {
            instance: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.instance.get().cloned()
    }

    /// A load is in flight exactly while the init lock is held.
    pub fn state(&self) -> SessionState {
        if self.instance.get().is_some() {
            return SessionState::Ready;
        }
        match self.init.try_lock() {
            Err(TryLockError::WouldBlock) => SessionState::Initializing,
            Ok(_) | Err(TryLockError::Poisoned(_)) => SessionState::Uninitialized,
        }
    }

    /// Returns the shared instance, running `load` if there is none yet.
    ///
    /// Load failures are wrapped in [`Error::SessionInit`].
    pub fn get_or_try_init<F>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(instance) = self.instance.get() {
            return Ok(Arc::clone(instance));
        }

        // the guarded data is (), a panicking loader leaves nothing to repair
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = self.instance.get() {
            return Ok(Arc::clone(instance));
        }

        let instance = Arc::new(load().map_err(|err| Error::SessionInit(Box::new(err)))?);
        Ok(Arc::clone(self.instance.get_or_init(|| instance)))
    }
}

impl<T> Default for SessionCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

static SESSION: SessionCell<Lemmatizer> = SessionCell::new();

/// The process-wide lemmatizer, configured through `KORRA_HEB_CONFIG`.
pub fn session() -> Result<Arc<Lemmatizer>> {
    SESSION.get_or_try_init(|| {
        debug!("Initializing process-wide lemmatizer session");
        let config = Config::from_env()?;
        Lemmatizer::from_config(&config)
    })
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use super::{SessionCell, SessionState};
    use crate::lemma::lemmatizer::tests::{peaks, tokenizer, FnScorer};
    use crate::lemma::{Batch, Lemmatize, Lemmatizer};
    use crate::{Config, Error};

    #[test]
    fn concurrent_first_use_loads_once() {
        const THREADS: usize = 8;

        let cell = Arc::new(SessionCell::new());
        let loads = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let loads = Arc::clone(&loads);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cell.get_or_try_init(|| {
                        loads.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        let scorer =
                            FnScorer::new(|batch: &Batch| Ok(peaks(batch, 17, &[(1, 5)])));
                        Ok(Lemmatizer::new(tokenizer(), Box::new(scorer)))
                    })
                    .unwrap()
                })
            })
            .collect();

        let sessions: Vec<Arc<Lemmatizer>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cell.state(), SessionState::Ready);
        for session in &sessions {
            assert!(Arc::ptr_eq(session, &sessions[0]));
            assert_eq!(session.lemmatize(&["בתים"]).into_vec(), vec!["בית"]);
        }
    }

    #[test]
    fn failed_init_is_retried() {
        let cell: SessionCell<usize> = SessionCell::new();
        assert_eq!(cell.state(), SessionState::Uninitialized);

        let err = cell
            .get_or_try_init(|| Err(Error::Inference("no model".to_string())))
            .unwrap_err();
        assert!(matches!(err, Error::SessionInit(_)));
        assert_eq!(cell.state(), SessionState::Uninitialized);
        assert!(cell.get().is_none());

        assert_eq!(*cell.get_or_try_init(|| Ok(42)).unwrap(), 42);
        // ready cells never run the loader again
        assert_eq!(*cell.get_or_try_init(|| Ok(7)).unwrap(), 42);
        assert_eq!(cell.state(), SessionState::Ready);
    }

    #[test]
    fn reports_initializing_state() {
        let cell: Arc<SessionCell<usize>> = Arc::new(SessionCell::new());
        let observer = Arc::clone(&cell);
        let value = cell
            .get_or_try_init(|| {
                assert_eq!(observer.state(), SessionState::Initializing);
                Ok(1)
            })
            .unwrap();
        assert_eq!(*value, 1);
    }

    #[test]
    fn panicking_loader_leaves_cell_usable() {
        let cell: SessionCell<usize> = SessionCell::new();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            cell.get_or_try_init(|| panic!("loader exploded"))
        }));
        assert!(result.is_err());
        assert_eq!(cell.state(), SessionState::Uninitialized);

        assert_eq!(*cell.get_or_try_init(|| Ok(3)).unwrap(), 3);
        assert_eq!(cell.state(), SessionState::Ready);
    }

    #[test]
    fn load_failure_surfaces_as_init_error() {
        let cache = tempfile::tempdir().unwrap();
        let config = Config {
            model_dir: "testdata/no-model".into(),
            cache_dir: Some(cache.path().to_owned()),
            ..Config::default()
        };

        let cell: SessionCell<Lemmatizer> = SessionCell::new();
        match cell.get_or_try_init(|| Lemmatizer::from_config(&config)) {
            Err(Error::SessionInit(cause)) => assert!(matches!(*cause, Error::Resource { .. })),
            Err(err) => panic!("unexpected error: {}", err),
            Ok(_) => panic!("loaded a lemmatizer without model files"),
        }
        assert_eq!(cell.state(), SessionState::Uninitialized);
    }
}
