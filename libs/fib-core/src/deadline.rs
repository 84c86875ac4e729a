use std::time::{Duration, Instant};

/// A point in time after which cancellable computations give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn after(budget: Duration) -> Self {
        Self::at(Instant::now() + budget)
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_already_expired() {
        let deadline = Deadline::after(Duration::ZERO);
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn generous_budget_is_not_expired() {
        let deadline = Deadline::after(Duration::from_secs(3600));
        assert!(!deadline.is_expired());
        assert!(deadline.remaining() > Duration::from_secs(3500));
    }
}
