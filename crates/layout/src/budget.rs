use crate::LayoutError;
use std::time::{Duration, Instant};

/// Deadline shared by every step of one render.
///
/// Long loops call [`RenderBudget::check`] so a pathological value aborts the
/// render instead of stalling a worker.
#[derive(Debug, Clone, Copy)]
pub struct RenderBudget {
    started: Instant,
    limit: Option<Duration>,
}

impl RenderBudget {
    pub fn new(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit: Some(limit),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            started: Instant::now(),
            limit: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn check(&self) -> Result<(), LayoutError> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        let elapsed = self.started.elapsed();
        if elapsed >= limit {
            return Err(LayoutError::Timeout {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: limit.as_millis() as u64,
            });
        }
        Ok(())
    }
}

impl Default for RenderBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_already_spent() {
        let budget = RenderBudget::new(Duration::ZERO);
        assert!(matches!(
            budget.check(),
            Err(LayoutError::Timeout { budget_ms: 0, .. })
        ));
    }

    #[test]
    fn generous_budget_passes() {
        assert!(RenderBudget::new(Duration::from_secs(60)).check().is_ok());
        assert!(RenderBudget::unlimited().check().is_ok());
    }
}
