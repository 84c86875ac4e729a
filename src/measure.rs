use std::time::{Duration, Instant};

use fib_core::{Deadline, MemoCache, Strategy};
use serde::Serialize;

use crate::error::Result;

/// One cold, un-averaged timing of a single strategy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub strategy: Strategy,
    pub n: u32,
    pub value: u64,
    pub elapsed: Duration,
}

/// Six digits after the decimal point, the format every table expects.
pub fn format_seconds(elapsed: Duration) -> String {
    format!("{:.6}", elapsed.as_secs_f64())
}

/// Times strategy invocations. Owns the memoization cache, so its lifetime
/// is the cache's lifetime.
#[derive(Debug, Default)]
pub struct Harness {
    cache: MemoCache,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    /// Runs `strategy` exactly once between two clock reads. No warm-up,
    /// no retry; errors from the strategy propagate unchanged.
    pub fn time(
        &mut self,
        strategy: Strategy,
        n: u32,
        deadline: Option<&Deadline>,
    ) -> Result<Sample> {
        let start = Instant::now();
        let value = strategy.evaluate(n, &mut self.cache, deadline)?;
        let elapsed = start.elapsed();
        tracing::debug!(%strategy, n, value, elapsed_us = elapsed.as_micros() as u64, "timed invocation");
        Ok(Sample {
            strategy,
            n,
            value,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use fib_core::FibError;

    #[test]
    fn formats_six_decimals() {
        assert_eq!(format_seconds(Duration::ZERO), "0.000000");
        assert_eq!(format_seconds(Duration::from_micros(1_500_250)), "1.500250");
        assert_eq!(format_seconds(Duration::from_nanos(400)), "0.000000");
    }

    #[test]
    fn every_strategy_reports_the_same_value() {
        let mut harness = Harness::new();
        for strategy in Strategy::ALL {
            let sample = harness.time(strategy, 25, None).unwrap();
            assert_eq!(sample.value, 75_025);
            assert_eq!(sample.n, 25);
            assert_eq!(sample.strategy, strategy);
        }
    }

    #[test]
    fn dp_reuses_the_harness_cache() {
        let mut harness = Harness::new();
        harness.time(Strategy::Memoized, 30, None).unwrap();
        let first = harness.cache().computations() + harness.cache().lookups();
        harness.time(Strategy::Memoized, 30, None).unwrap();
        let second = harness.cache().computations() + harness.cache().lookups() - first;
        assert!(second <= first);
        assert_eq!(second, 1);
    }

    #[test]
    fn expired_deadline_surfaces_as_error() {
        let mut harness = Harness::new();
        let deadline = Deadline::after(Duration::ZERO);
        let err = harness
            .time(Strategy::Recursive, 45, Some(&deadline))
            .unwrap_err();
        assert!(matches!(
            err,
            BenchError::Fib(FibError::DeadlineExceeded(45))
        ));
    }
}
