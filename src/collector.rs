//! Sweeps every configured implementation across a range of `n` and
//! turns each data point into a table cell.
//!
//! A data point that times out becomes `TIMEOUT`, anything else that fails
//! becomes `ERROR`, and the sweep moves on. Nothing is retried.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fib_core::{Deadline, FibError, Strategy};
use serde_json::json;
use tokio::process::Command;

use crate::config::{BenchConfig, ImplementationConfig, RunnerMode};
use crate::error::{BenchError, Result};
use crate::method::{self, Method};
use crate::metrics::{MetricsTracker, SweepGuard, SweepReport};
use crate::table::{Cell, Row, Table};
use crate::telemetry::{FailureRecord, TelemetryCollector};

/// Produces the stdout of `<program> <method> <n>` within a time budget.
#[async_trait]
pub trait Runner: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, method: Method, n: u32, budget: Duration) -> Result<String>;
}

/// Spawns one process per data point and kills it when the budget runs out.
pub struct SubprocessRunner {
    name: String,
    program: String,
    args: Vec<String>,
}

impl SubprocessRunner {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn describe(&self, method: Method, n: u32) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.push(method.to_string());
        parts.push(n.to_string());
        parts.join(" ")
    }
}

#[async_trait]
impl Runner for SubprocessRunner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, method: Method, n: u32, budget: Duration) -> Result<String> {
        let command = self.describe(method, n);
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(method.name())
            .arg(n.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(budget, cmd.output())
            .await
            .map_err(|_| BenchError::Timeout {
                command: command.clone(),
                seconds: budget.as_secs(),
            })?
            .map_err(|source| BenchError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BenchError::ExitStatus {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Runs the strategies in this process on a blocking task, bounded by a
/// cooperative [`Deadline`] instead of a process kill.
pub struct InProcessRunner {
    name: String,
}

impl InProcessRunner {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Runner for InProcessRunner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, method: Method, n: u32, budget: Duration) -> Result<String> {
        let deadline = Deadline::after(budget);
        let command = format!("{}:{method} {n}", self.name);
        tokio::task::spawn_blocking(move || -> Result<String> {
            let mut out = Vec::new();
            method::execute(method, n, Some(&deadline), &mut out)?;
            Ok(String::from_utf8_lossy(&out).into_owned())
        })
        .await
        .map_err(|err| BenchError::Output {
            command: command.clone(),
            output: format!("worker failed: {err}"),
        })?
        .map_err(|err| match err {
            BenchError::Fib(FibError::DeadlineExceeded(_)) => BenchError::Timeout {
                command,
                seconds: budget.as_secs(),
            },
            other => other,
        })
    }
}

pub fn parse_seconds(command: &str, stdout: &str) -> Result<Cell> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Cell::Seconds)
        .ok_or_else(|| BenchError::Output {
            command: command.to_string(),
            output: stdout.trim().to_string(),
        })
}

pub fn parse_operations(command: &str, stdout: &str) -> Result<Cell> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("Operations:"))
        .and_then(|count| count.trim().parse::<u64>().ok())
        .map(Cell::Count)
        .ok_or_else(|| BenchError::Output {
            command: command.to_string(),
            output: stdout.lines().last().unwrap_or_default().to_string(),
        })
}

/// Maps a failed data point to its sentinel. A recursive run that exits
/// abnormally is counted as a timeout, the usual reason it dies.
pub fn sentinel_for(strategy: Strategy, err: &BenchError) -> Cell {
    match err {
        BenchError::Timeout { .. } | BenchError::Fib(FibError::DeadlineExceeded(_)) => {
            Cell::Timeout
        }
        BenchError::ExitStatus { .. } if strategy == Strategy::Recursive => Cell::Timeout,
        _ => Cell::Error,
    }
}

/// Tables written for one implementation.
#[derive(Debug, Clone)]
pub struct CollectionSummary {
    pub implementation: String,
    pub timings_path: PathBuf,
    pub ops_path: PathBuf,
    pub report: SweepReport,
}

pub struct Collector {
    config: BenchConfig,
    telemetry: TelemetryCollector,
    metrics: MetricsTracker,
}

impl Collector {
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config,
            telemetry: TelemetryCollector::default(),
            metrics: MetricsTracker::default(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsTracker) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Builds the runner for an implementation. An empty command means the
    /// executable that is currently running.
    pub fn runner_for(implementation: &ImplementationConfig) -> Result<Arc<dyn Runner>> {
        match implementation.mode {
            RunnerMode::InProcess => Ok(Arc::new(InProcessRunner::new(&implementation.name))),
            RunnerMode::Subprocess => {
                let (program, args) = match implementation.command.split_first() {
                    Some((program, args)) => (program.clone(), args.to_vec()),
                    None => {
                        let exe = std::env::current_exe()?;
                        (exe.to_string_lossy().into_owned(), Vec::new())
                    }
                };
                Ok(Arc::new(
                    SubprocessRunner::new(&implementation.name, program).with_args(args),
                ))
            }
        }
    }

    pub fn budget(&self, strategy: Strategy) -> Duration {
        match strategy {
            Strategy::Recursive => Duration::from_secs(self.config.timeouts.recursive_secs),
            _ => Duration::from_secs(self.config.timeouts.default_secs),
        }
    }

    async fn data_point(
        &self,
        runner: &dyn Runner,
        guard: &mut SweepGuard,
        method: Method,
        n: u32,
    ) -> Cell {
        let command = format!("{} {method} {n}", runner.name());
        let outcome = match runner.run(method, n, self.budget(method.strategy())).await {
            Ok(stdout) => match method {
                Method::Time(_) => parse_seconds(&command, &stdout),
                Method::Print(_) => parse_operations(&command, &stdout),
            },
            Err(err) => Err(err),
        };
        let cell = match outcome {
            Ok(cell) => cell,
            Err(err) => {
                let cell = sentinel_for(method.strategy(), &err);
                tracing::warn!(implementation = runner.name(), %method, n, sentinel = %cell, error = %err, "data point failed");
                self.telemetry.record_failure(FailureRecord {
                    implementation: runner.name().to_string(),
                    method: method.to_string(),
                    n,
                    sentinel: cell.to_string(),
                    error: err.to_string(),
                });
                cell
            }
        };
        guard.record_point(&cell);
        cell
    }

    /// One timing sample per strategy for `n = 1..=timing_max_n`.
    pub async fn collect_timings(&self, runner: &dyn Runner, guard: &mut SweepGuard) -> Table {
        let mut table = Table::default();
        for n in 1..=self.config.sweep.timing_max_n {
            let mut row = Row::pending(n);
            for strategy in Strategy::ALL {
                let cell = self.data_point(runner, guard, Method::Time(strategy), n).await;
                row.set(strategy, cell);
            }
            tracing::info!(implementation = runner.name(), n, "collected timings");
            table.rows.push(row);
        }
        table
    }

    /// Operation counts from the series printers for `n = 1..=ops_max_n`.
    pub async fn collect_operations(&self, runner: &dyn Runner, guard: &mut SweepGuard) -> Table {
        let mut table = Table::default();
        for n in 1..=self.config.sweep.ops_max_n {
            let mut row = Row::pending(n);
            for strategy in Strategy::ALL {
                let cell = self.data_point(runner, guard, Method::Print(strategy), n).await;
                row.set(strategy, cell);
            }
            tracing::debug!(implementation = runner.name(), n, "collected operations");
            table.rows.push(row);
        }
        table
    }

    pub async fn collect_implementation(
        &self,
        implementation: &ImplementationConfig,
    ) -> Result<CollectionSummary> {
        let runner = Self::runner_for(implementation)?;
        let mut guard = self.metrics.start_sweep(&implementation.name);
        self.telemetry.record(
            "sweep_started",
            json!({"implementation": implementation.name, "mode": implementation.mode}),
        );

        let timings = self.collect_timings(runner.as_ref(), &mut guard).await;
        let timings_path = self.config.timings_path(&implementation.name);
        timings.write(&timings_path).await?;

        let ops = self.collect_operations(runner.as_ref(), &mut guard).await;
        let ops_path = self.config.ops_path(&implementation.name);
        ops.write(&ops_path).await?;

        let report = guard.finish();
        tracing::info!(
            implementation = %implementation.name,
            data_points = report.data_points,
            timeouts = report.timeouts,
            errors = report.errors,
            elapsed_ms = report.duration.as_millis() as u64,
            "sweep finished"
        );
        self.telemetry.record(
            "sweep_finished",
            json!({
                "implementation": implementation.name,
                "data_points": report.data_points,
                "timeouts": report.timeouts,
                "errors": report.errors,
            }),
        );
        Ok(CollectionSummary {
            implementation: implementation.name.clone(),
            timings_path,
            ops_path,
            report,
        })
    }

    pub async fn collect_all(&self) -> Result<Vec<CollectionSummary>> {
        let mut summaries = Vec::with_capacity(self.config.implementations.len());
        for implementation in &self.config.implementations {
            summaries.push(self.collect_implementation(implementation).await?);
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SweepConfig;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Scripted runner: recursive timings past `slow_from` time out.
    struct ScriptedRunner {
        slow_from: u32,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Runner for ScriptedRunner {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn run(&self, method: Method, n: u32, budget: Duration) -> Result<String> {
            self.calls.lock().unwrap().push(format!("{method} {n}"));
            match method {
                Method::Time(Strategy::Recursive) if n >= self.slow_from => {
                    Err(BenchError::Timeout {
                        command: format!("{method} {n}"),
                        seconds: budget.as_secs(),
                    })
                }
                Method::Time(Strategy::Memoized) if n == 2 => Ok("garbage\n".into()),
                Method::Time(_) => Ok("0.000001\n".into()),
                Method::Print(_) => Ok(format!("1: 0\nOperations: {n}\n")),
            }
        }
    }

    fn config(dir: &std::path::Path) -> BenchConfig {
        let mut config = BenchConfig::default();
        config.sweep = SweepConfig {
            timing_max_n: 4,
            ops_max_n: 3,
        };
        config.output.dir = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn failures_become_sentinels() {
        let dir = tempdir().unwrap();
        let collector = Collector::new(config(dir.path()));
        let runner = ScriptedRunner {
            slow_from: 3,
            calls: Mutex::new(Vec::new()),
        };
        let mut guard = MetricsTracker::default().start_sweep("scripted");
        let table = collector.collect_timings(&runner, &mut guard).await;

        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0].recursive, Cell::Seconds(0.000001));
        assert_eq!(table.rows[1].dp, Cell::Error);
        assert_eq!(table.rows[2].recursive, Cell::Timeout);
        assert_eq!(table.rows[3].recursive, Cell::Timeout);
        assert_eq!(table.rows[3].iterative, Cell::Seconds(0.000001));

        // the sweep keeps going after a failure and never retries
        assert_eq!(runner.calls.lock().unwrap().len(), 12);
        let report = guard.finish();
        assert_eq!(report.timeouts, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(collector.telemetry().failure_count(), 3);
    }

    #[tokio::test]
    async fn operations_come_from_the_last_line() {
        let dir = tempdir().unwrap();
        let collector = Collector::new(config(dir.path()));
        let runner = ScriptedRunner {
            slow_from: u32::MAX,
            calls: Mutex::new(Vec::new()),
        };
        let mut guard = MetricsTracker::default().start_sweep("scripted");
        let table = collector.collect_operations(&runner, &mut guard).await;
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2].dp, Cell::Count(3));
    }

    #[test]
    fn recursive_exit_failures_count_as_timeouts() {
        let err = BenchError::ExitStatus {
            command: "x".into(),
            status: "exit status: 1".into(),
            stderr: String::new(),
        };
        assert_eq!(sentinel_for(Strategy::Recursive, &err), Cell::Timeout);
        assert_eq!(sentinel_for(Strategy::Iterative, &err), Cell::Error);
        let deadline = BenchError::Fib(FibError::DeadlineExceeded(40));
        assert_eq!(sentinel_for(Strategy::Recursive, &deadline), Cell::Timeout);
    }

    #[test]
    fn parses_runner_output() {
        assert_eq!(parse_seconds("c", " 0.000123\n").unwrap(), Cell::Seconds(0.000123));
        assert!(parse_seconds("c", "Invalid method\n").is_err());
        assert_eq!(
            parse_operations("c", "1: 0\n2: 1\nOperations: 0\n").unwrap(),
            Cell::Count(0)
        );
        assert!(parse_operations("c", "1: 0\n").is_err());
    }

    #[tokio::test]
    async fn in_process_runner_honours_the_budget() {
        let runner = InProcessRunner::new("rust");
        let out = runner
            .run(Method::Print(Strategy::Memoized), 5, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(out.ends_with("Operations: 5\n"));

        let err = runner
            .run(Method::Time(Strategy::Recursive), 60, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, BenchError::Timeout { .. }));
    }

    #[tokio::test]
    async fn in_process_print_rec_honours_the_budget() {
        let runner = InProcessRunner::new("native");
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run(Method::Print(Strategy::Recursive), 60, Duration::from_millis(50)),
        )
        .await
        .expect("budget was not enforced");
        assert!(matches!(outcome, Err(BenchError::Timeout { .. })));
        assert_eq!(
            sentinel_for(Strategy::Recursive, &outcome.unwrap_err()),
            Cell::Timeout
        );
    }

    #[tokio::test]
    async fn missing_program_is_an_error_cell() {
        let dir = tempdir().unwrap();
        let collector = Collector::new(config(dir.path()));
        let runner = SubprocessRunner::new("ghost", "/nonexistent/fib-ghost");
        let mut guard = MetricsTracker::default().start_sweep("ghost");
        let cell = collector
            .data_point(&runner, &mut guard, Method::Time(Strategy::Iterative), 1)
            .await;
        assert_eq!(cell, Cell::Error);
    }
}
