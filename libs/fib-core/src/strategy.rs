use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::deadline::Deadline;
use crate::error::{FibError, Result};
use crate::memo::MemoCache;

/// Largest index whose Fibonacci number fits in a `u64`.
pub const MAX_INDEX: u32 = 93;

/// How many recursive calls happen between two clock reads.
const POLL_INTERVAL: u64 = 4096;

pub fn check_index(n: u32) -> Result<u32> {
    if n > MAX_INDEX {
        return Err(FibError::IndexOutOfRange {
            index: n as u64,
            max: MAX_INDEX,
        });
    }
    Ok(n)
}

/// Converts a signed index coming from user input into a valid one.
pub fn index_from_i64(n: i64) -> Result<u32> {
    if n < 0 {
        return Err(FibError::NegativeIndex(n));
    }
    let n = u32::try_from(n).map_err(|_| FibError::IndexOutOfRange {
        index: n as u64,
        max: MAX_INDEX,
    })?;
    check_index(n)
}

/// O(n) time, O(1) space. Requires `n <= MAX_INDEX`.
pub fn fib_iterative(n: u32) -> u64 {
    if n <= 1 {
        return n as u64;
    }
    let (mut prev, mut curr) = (0u64, 1u64);
    for _ in 2..=n {
        let next = prev + curr;
        prev = curr;
        curr = next;
    }
    curr
}

/// The defining recurrence with no memoization: O(2^n) time, O(n) stack.
///
/// There is no internal cutoff. Callers that need a time budget use
/// [`fib_recursive_within`] or run this in a process they can kill.
pub fn fib_recursive(n: u32) -> u64 {
    if n <= 1 {
        return n as u64;
    }
    fib_recursive(n - 1) + fib_recursive(n - 2)
}

/// Same recurrence as [`fib_recursive`], abandoned once `deadline` passes.
///
/// The clock is read every `POLL_INTERVAL` calls, so small inputs finish even
/// with an expired deadline unless it had already expired on entry.
pub fn fib_recursive_within(n: u32, deadline: &Deadline) -> Result<u64> {
    if deadline.is_expired() {
        return Err(FibError::DeadlineExceeded(n));
    }
    let mut calls = 0u64;
    recurse_within(n, deadline, &mut calls).ok_or(FibError::DeadlineExceeded(n))
}

fn recurse_within(n: u32, deadline: &Deadline, calls: &mut u64) -> Option<u64> {
    *calls += 1;
    if *calls % POLL_INTERVAL == 0 && deadline.is_expired() {
        return None;
    }
    if n <= 1 {
        return Some(n as u64);
    }
    Some(recurse_within(n - 1, deadline, calls)? + recurse_within(n - 2, deadline, calls)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Iterative,
    Recursive,
    #[serde(rename = "dp")]
    Memoized,
}

impl Strategy {
    /// Column order used by every table.
    pub const ALL: [Strategy; 3] = [Strategy::Iterative, Strategy::Recursive, Strategy::Memoized];

    /// Method name accepted on the command line for timing.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Iterative => "iterative",
            Strategy::Recursive => "recursive",
            Strategy::Memoized => "dp",
        }
    }

    /// Method name of the matching series printer.
    pub fn print_name(self) -> &'static str {
        match self {
            Strategy::Iterative => "print_iter",
            Strategy::Recursive => "print_rec",
            Strategy::Memoized => "print_dp",
        }
    }

    /// Header used for this strategy in CSV tables.
    pub fn column(self) -> &'static str {
        match self {
            Strategy::Iterative => "Iterative",
            Strategy::Recursive => "Recursive",
            Strategy::Memoized => "DP",
        }
    }

    /// Computes F(n) once. Only the recursive strategy honours `deadline`;
    /// the linear ones always finish well inside any realistic budget.
    pub fn evaluate(
        self,
        n: u32,
        cache: &mut MemoCache,
        deadline: Option<&Deadline>,
    ) -> Result<u64> {
        let n = check_index(n)?;
        match (self, deadline) {
            (Strategy::Iterative, _) => Ok(fib_iterative(n)),
            (Strategy::Recursive, None) => Ok(fib_recursive(n)),
            (Strategy::Recursive, Some(deadline)) => fib_recursive_within(n, deadline),
            (Strategy::Memoized, _) => Ok(cache.fib(n)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = FibError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "iterative" => Ok(Strategy::Iterative),
            "recursive" => Ok(Strategy::Recursive),
            "dp" => Ok(Strategy::Memoized),
            other => Err(FibError::UnknownStrategy(other.to_string())),
        }
    }
}
