use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deadline::Deadline;
use crate::error::Result;
use crate::memo::MemoCache;
use crate::strategy::{check_index, fib_iterative, fib_recursive, fib_recursive_within, Strategy};

/// Work reported by a series printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OperationCount {
    Exact(u64),
    /// Loop steps standing in for recursive calls; undercounts the real work.
    /// See [`recursive_call_count`] for the true figure.
    Approximate(u64),
}

impl OperationCount {
    pub fn value(self) -> u64 {
        match self {
            OperationCount::Exact(v) | OperationCount::Approximate(v) => v,
        }
    }

    pub fn is_exact(self) -> bool {
        matches!(self, OperationCount::Exact(_))
    }
}

/// The first `N` terms of the sequence plus the work it took to list them.
///
/// Entry `i` (1-based) holds F(i - 1), so `N = 5` lists `0, 1, 1, 2, 3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub strategy: Strategy,
    pub entries: Vec<(u32, u64)>,
    pub operations: OperationCount,
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, value) in &self.entries {
            writeln!(f, "{index}: {value}")?;
        }
        writeln!(f, "Operations: {}", self.operations.value())
    }
}

/// Validates a series length: the last listed term is F(n - 1).
pub fn check_series_len(n: u32) -> Result<u32> {
    if n > 0 {
        check_index(n - 1)?;
    }
    Ok(n)
}

/// One addition per listed term beyond the first two: `max(N - 2, 0)`.
pub fn series_iterative(n: u32) -> Result<Series> {
    check_series_len(n)?;
    let mut entries = Vec::with_capacity(n as usize);
    if n >= 1 {
        entries.push((1, 0));
    }
    if n >= 2 {
        entries.push((2, 1));
    }
    let (mut prev, mut curr) = (0u64, 1u64);
    let mut ops = 0u64;
    for i in 3..=n {
        let next = prev + curr;
        entries.push((i, next));
        prev = curr;
        curr = next;
        ops += 1;
    }
    Ok(Series {
        strategy: Strategy::Iterative,
        entries,
        operations: OperationCount::Exact(ops),
    })
}

/// Recomputes every term from scratch. The count is `max(N - 1, 0)`, kept
/// for compatibility with earlier data and flagged as approximate.
pub fn series_recursive(n: u32) -> Result<Series> {
    recursive_terms(n, |i| Ok(fib_recursive(i)))
}

/// [`series_recursive`] abandoned once `deadline` passes.
pub fn series_recursive_within(n: u32, deadline: &Deadline) -> Result<Series> {
    recursive_terms(n, |i| fib_recursive_within(i, deadline))
}

fn recursive_terms(n: u32, mut term: impl FnMut(u32) -> Result<u64>) -> Result<Series> {
    check_series_len(n)?;
    let mut entries = Vec::with_capacity(n as usize);
    let mut ops = 0u64;
    for i in 1..=n {
        entries.push((i, term(i - 1)?));
        if i > 1 {
            ops += 1;
        }
    }
    Ok(Series {
        strategy: Strategy::Recursive,
        entries,
        operations: OperationCount::Approximate(ops),
    })
}

/// One counted recurrence invocation per term: exactly `N`.
pub fn series_dp(n: u32, cache: &mut MemoCache) -> Result<Series> {
    check_series_len(n)?;
    let mut entries = Vec::with_capacity(n as usize);
    let mut ops = 0u64;
    for i in 1..=n {
        entries.push((i, cache.fib(i - 1)));
        ops += 1;
    }
    Ok(Series {
        strategy: Strategy::Memoized,
        entries,
        operations: OperationCount::Exact(ops),
    })
}

/// Exact number of calls `fib_recursive(n)` makes: `2 * F(n + 1) - 1`.
pub fn recursive_call_count(n: u32) -> Result<u128> {
    let next = check_index(n.saturating_add(1))?;
    Ok(2 * fib_iterative(next) as u128 - 1)
}
