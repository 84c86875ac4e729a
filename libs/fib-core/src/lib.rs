//! Fibonacci strategies and their measurement contract.
//!
//! The crate provides:
//! - Three ways to compute F(n): iterative, naive recursive and memoized.
//! - An explicit, caller-owned memoization cache (`MemoCache`).
//! - Series printers that also report an operation count (`Series`).
//! - A cooperative `Deadline` for bounding the recursive strategy in-process.

mod deadline;
mod error;
mod memo;
mod series;
mod strategy;

pub use deadline::Deadline;
pub use error::{FibError, Result};
pub use memo::MemoCache;
pub use series::{
    check_series_len, recursive_call_count, series_dp, series_iterative, series_recursive,
    series_recursive_within, OperationCount, Series,
};
pub use strategy::{
    check_index, fib_iterative, fib_recursive, fib_recursive_within, index_from_i64, Strategy,
    MAX_INDEX,
};
