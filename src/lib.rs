//! Benchmarks the iterative, recursive and memoized Fibonacci strategies.
//!
//! The crate provides:
//! - A timing wrapper that takes one cold sample per invocation (`Harness`).
//! - The `<method> <n>` command line other tools parse (`cli`, `Method`).
//! - A collector that sweeps implementations into CSV tables (`Collector`).
//! - SVG charts and a verification pass over the collected results.

pub mod chart;
pub mod cli;
mod collector;
mod config;
mod error;
mod measure;
mod method;
mod metrics;
mod table;
mod telemetry;
pub mod verify;

pub use collector::{
    parse_operations, parse_seconds, sentinel_for, CollectionSummary, Collector,
    InProcessRunner, Runner, SubprocessRunner,
};
pub use config::{
    BenchConfig, ImplementationConfig, LoggingConfig, OutputConfig, RunnerMode, SweepConfig,
    TimeoutConfig,
};
pub use error::{BenchError, Result};
pub use measure::{format_seconds, Harness, Sample};
pub use method::{execute, Method};
pub use metrics::{MetricsTracker, SweepGuard, SweepReport};
pub use table::{Cell, Row, Table, ERROR, TIMEOUT};
pub use telemetry::{init_tracing, FailureRecord, TelemetryCollector, TelemetryEvent};

pub use fib_core;
