//! Executor implementations for batch rendering.
//!
//! - [`RayonExecutor`]: work-stealing thread pool (feature: `rayon`)
//! - [`SyncExecutor`]: sequential execution (re-exported from annex9-traits)

#[cfg(feature = "rayon")]
mod rayon_executor;

#[cfg(feature = "rayon")]
pub use rayon_executor::RayonExecutor;

pub use annex9_traits::{Executor, SyncExecutor};

/// Concrete executor choice.
///
/// `Executor` has generic methods and is not object safe, so callers that
/// pick an implementation at runtime hold this enum instead of a `dyn`.
#[derive(Clone, Debug)]
pub enum ExecutorImpl {
    Sync(SyncExecutor),

    #[cfg(feature = "rayon")]
    Rayon(RayonExecutor),
}

/// Forwards a call to whichever executor is held.
macro_rules! dispatch {
    ($self:ident, $exec:ident => $call:expr) => {
        match $self {
            ExecutorImpl::Sync($exec) => $call,
            #[cfg(feature = "rayon")]
            ExecutorImpl::Rayon($exec) => $call,
        }
    };
}

impl ExecutorImpl {
    /// Picks an executor for the requested worker count.
    ///
    /// `Some(1)` runs sequentially, `Some(n)` builds a dedicated pool of `n`
    /// threads and `None` shares the global pool. Without the `rayon` feature
    /// every batch runs sequentially.
    pub fn for_workers(workers: Option<usize>) -> Self {
        match workers {
            Some(0 | 1) => ExecutorImpl::Sync(SyncExecutor::new()),
            #[cfg(feature = "rayon")]
            Some(n) => match RayonExecutor::with_threads(n) {
                Ok(exec) => ExecutorImpl::Rayon(exec),
                Err(e) => {
                    log::warn!("Could not build a {n}-thread pool ({e}), using the global pool");
                    ExecutorImpl::Rayon(RayonExecutor::new())
                }
            },
            #[cfg(feature = "rayon")]
            None => ExecutorImpl::Rayon(RayonExecutor::new()),
            #[cfg(not(feature = "rayon"))]
            _ => ExecutorImpl::Sync(SyncExecutor::new()),
        }
    }

    /// Whether batches may render more than one order at a time.
    pub fn is_parallel(&self) -> bool {
        self.parallelism() > 1
    }
}

impl Executor for ExecutorImpl {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static,
    {
        dispatch!(self, exec => exec.execute_all(items, f))
    }

    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static,
    {
        dispatch!(self, exec => exec.execute_all_fallible(items, f))
    }

    fn parallelism(&self) -> usize {
        dispatch!(self, exec => exec.parallelism())
    }

    fn name(&self) -> &'static str {
        dispatch!(self, exec => exec.name())
    }
}

impl Default for ExecutorImpl {
    /// The shared pool, as used when no worker count is configured.
    fn default() -> Self {
        Self::for_workers(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_worker_is_sequential() {
        for workers in [Some(0), Some(1)] {
            let exec = ExecutorImpl::for_workers(workers);
            assert_eq!(exec.name(), "SyncExecutor");
            assert!(!exec.is_parallel());
        }
    }

    #[test]
    fn fallible_jobs_keep_their_slot() {
        let exec = ExecutorImpl::for_workers(Some(2));
        let results: Vec<Result<u32, String>> = exec.execute_all_fallible(vec![4, 0, 6], |x| {
            if x == 0 {
                Err("missing reference".to_string())
            } else {
                Ok(x / 2)
            }
        });
        assert_eq!(results, vec![Ok(2), Err("missing reference".to_string()), Ok(3)]);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn dedicated_pool_reports_its_size() {
        let exec = ExecutorImpl::for_workers(Some(3));
        assert_eq!(exec.name(), "RayonExecutor");
        assert_eq!(exec.parallelism(), 3);
        assert!(exec.is_parallel());
    }

    #[test]
    fn results_come_back_in_input_order() {
        let exec = ExecutorImpl::default();
        let items: Vec<u32> = (0..64).collect();
        let results = exec.execute_all(items.clone(), |x| x + 1);
        assert_eq!(results, items.iter().map(|x| x + 1).collect::<Vec<_>>());
    }
}
