//! Rayon-based parallel executor.

use annex9_traits::Executor;
use rayon::prelude::*;
use std::sync::Arc;

/// Parallel executor on rayon's work-stealing pool.
///
/// Uses the global pool unless built with [`RayonExecutor::with_threads`].
/// Indexed parallel iteration keeps results in input order.
#[derive(Debug, Clone)]
pub struct RayonExecutor {
    pool: Option<Arc<rayon::ThreadPool>>,
    num_threads: usize,
}

impl RayonExecutor {
    pub fn new() -> Self {
        Self {
            pool: None,
            num_threads: rayon::current_num_threads(),
        }
    }

    /// Builds an executor with its own pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("annex9-render-{i}"))
            .build()?;
        Ok(Self {
            num_threads: pool.current_num_threads(),
            pool: Some(Arc::new(pool)),
        })
    }

    fn run<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Default for RayonExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for RayonExecutor {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static,
    {
        self.run(|| items.into_par_iter().map(f).collect())
    }

    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static,
    {
        self.run(|| items.into_par_iter().map(f).collect())
    }

    fn parallelism(&self) -> usize {
        self.num_threads
    }

    fn name(&self) -> &'static str {
        "RayonExecutor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn processes_every_item_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let results = RayonExecutor::new().execute_all((0..100).collect(), move |x: usize| {
            c.fetch_add(1, Ordering::SeqCst);
            x * 2
        });
        assert_eq!(counter.load(Ordering::SeqCst), 100);
        assert_eq!(results[99], 198);
    }

    #[test]
    fn failures_are_reported_per_item() {
        let exec = RayonExecutor::with_threads(2).unwrap();
        let results: Vec<Result<i32, &str>> =
            exec.execute_all_fallible(vec![1, 0, 3], |x| if x == 0 { Err("bad") } else { Ok(x) });
        assert_eq!(results, vec![Ok(1), Err("bad"), Ok(3)]);
    }
}
