//! Executor trait for running independent render jobs.

use std::fmt::Debug;

/// Runs a batch of independent work items, possibly in parallel.
///
/// Results always come back in input order, whatever the scheduling.
pub trait Executor: Send + Sync + Debug {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static;

    /// Like [`Executor::execute_all`], for jobs that may fail individually.
    /// One failure never aborts the others.
    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static;

    /// Number of jobs that may run at the same time.
    fn parallelism(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Processes items one after another on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncExecutor;

impl SyncExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for SyncExecutor {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static,
    {
        items.into_iter().map(f).collect()
    }

    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static,
    {
        items.into_iter().map(f).collect()
    }

    fn parallelism(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str {
        "SyncExecutor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_executor_keeps_input_order() {
        let results = SyncExecutor::new().execute_all(vec![3, 1, 2], |x| x * 10);
        assert_eq!(results, vec![30, 10, 20]);
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let results: Vec<Result<u32, String>> =
            SyncExecutor::new().execute_all_fallible(vec![1, 0, 4], |x| {
                if x == 0 {
                    Err("empty order".to_string())
                } else {
                    Ok(x * 2)
                }
            });
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Ok(2));
        assert!(results[1].is_err());
        assert_eq!(results[2], Ok(8));
    }

    #[test]
    fn empty_batch_yields_nothing() {
        let results = SyncExecutor::new().execute_all(Vec::<u8>::new(), |x| x);
        assert!(results.is_empty());
        assert_eq!(SyncExecutor::new().parallelism(), 1);
    }
}
