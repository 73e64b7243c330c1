//! Wall-clock parse budget, checked between pipeline stages.

use std::time::{Duration, Instant};

use registry_types::ParseError;

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Err once the budget is spent. Callers check between pages and stages,
    /// so a parse never overruns by more than one stage.
    pub fn check(&self) -> Result<(), ParseError> {
        if self.started.elapsed() > self.budget {
            Err(ParseError::Timeout(self.budget))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_deadline_passes() {
        assert!(Deadline::new(Duration::from_secs(30)).check().is_ok());
    }

    #[test]
    fn test_spent_deadline_fails() {
        let deadline = Deadline::new(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        match deadline.check() {
            Err(ParseError::Timeout(budget)) => assert_eq!(budget, Duration::ZERO),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
