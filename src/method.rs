use std::fmt;
use std::io::Write;
use std::str::FromStr;

use fib_core::{
    series_dp, series_iterative, series_recursive, series_recursive_within, Deadline, MemoCache,
    Strategy,
};

use crate::error::{BenchError, Result};
use crate::measure::{format_seconds, Harness};

/// A `<method>` accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Print the elapsed seconds of one invocation.
    Time(Strategy),
    /// Print the series `1..=n` followed by the operation count.
    Print(Strategy),
}

impl Method {
    pub fn strategy(self) -> Strategy {
        match self {
            Method::Time(s) | Method::Print(s) => s,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Time(s) => s.name(),
            Method::Print(s) => s.print_name(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(strategy) = s.parse::<Strategy>() {
            return Ok(Method::Time(strategy));
        }
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.print_name() == s)
            .map(Method::Print)
            .ok_or_else(|| BenchError::InvalidMethod(s.to_string()))
    }
}

/// Runs `method` for `n` and writes the command-line output to `out`.
///
/// Each call gets a fresh cache, so a `dp` timing is always the cold fill.
/// `deadline` bounds the recursive strategy for both timing and printing.
pub fn execute(
    method: Method,
    n: u32,
    deadline: Option<&Deadline>,
    out: &mut impl Write,
) -> Result<()> {
    match method {
        Method::Time(strategy) => {
            let sample = Harness::new().time(strategy, n, deadline)?;
            writeln!(out, "{}", format_seconds(sample.elapsed))?;
        }
        Method::Print(strategy) => {
            let series = match strategy {
                Strategy::Iterative => series_iterative(n)?,
                Strategy::Recursive => match deadline {
                    Some(deadline) => series_recursive_within(n, deadline)?,
                    None => series_recursive(n)?,
                },
                Strategy::Memoized => series_dp(n, &mut MemoCache::new())?,
            };
            write!(out, "{series}")?;
        }
    }
    Ok(())
}
