use std::fmt;
use std::path::PathBuf;

use fib_core::{fib_iterative, fib_recursive, MemoCache};

use crate::chart::{complexity_chart_name, OPERATIONS_CHART, TIMING_CHART};
use crate::config::BenchConfig;
use crate::table::Table;

const KNOWN_PREFIX: [u64; 11] = [0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
const AGREEMENT_MAX_N: u32 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
}

impl VerificationReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let mark = if check.passed { "PASS" } else { "FAIL" };
            writeln!(f, "[{mark}] {}: {}", check.name, check.detail)?;
        }
        writeln!(
            f,
            "Verification Results: {}/{} checks passed",
            self.passed(),
            self.total()
        )
    }
}

/// The three strategies agree on `0..=30` and reproduce the known prefix.
pub fn check_correctness() -> CheckResult {
    let mut cache = MemoCache::new();
    let mismatch = (0..=AGREEMENT_MAX_N).find(|&n| {
        let iterative = fib_iterative(n);
        let expected = KNOWN_PREFIX.get(n as usize).copied().unwrap_or(iterative);
        iterative != expected || fib_recursive(n) != iterative || cache.fib(n) != iterative
    });
    match mismatch {
        None => CheckResult {
            name: "correctness",
            passed: true,
            detail: format!("all strategies agree for n in 0..={AGREEMENT_MAX_N}"),
        },
        Some(n) => CheckResult {
            name: "correctness",
            passed: false,
            detail: format!("strategies disagree at n={n}"),
        },
    }
}

/// Every table and chart the pipeline is expected to leave behind.
pub fn expected_files(config: &BenchConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for implementation in &config.implementations {
        files.push(config.timings_path(&implementation.name));
        files.push(config.ops_path(&implementation.name));
        files.push(
            config
                .output
                .dir
                .join(complexity_chart_name(&implementation.name)),
        );
    }
    files.push(config.output.dir.join(TIMING_CHART));
    files.push(config.output.dir.join(OPERATIONS_CHART));
    files
}

pub fn check_files(config: &BenchConfig) -> CheckResult {
    let missing: Vec<String> = expected_files(config)
        .into_iter()
        .filter(|path| !path.exists())
        .map(|path| path.display().to_string())
        .collect();
    CheckResult {
        name: "files",
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            "all expected tables and charts present".into()
        } else {
            format!("missing {}", missing.join(", "))
        },
    }
}

pub async fn check_tables(config: &BenchConfig) -> CheckResult {
    let mut problems = Vec::new();
    for implementation in &config.implementations {
        for path in [
            config.timings_path(&implementation.name),
            config.ops_path(&implementation.name),
        ] {
            if let Err(err) = Table::read(&path).await {
                problems.push(err.to_string());
            }
        }
    }
    CheckResult {
        name: "tables",
        passed: problems.is_empty(),
        detail: if problems.is_empty() {
            "all tables parse".into()
        } else {
            problems.join("; ")
        },
    }
}

pub async fn verify(config: &BenchConfig) -> VerificationReport {
    let report = VerificationReport {
        checks: vec![
            check_correctness(),
            check_files(config),
            check_tables(config).await,
        ],
    };
    for check in &report.checks {
        if check.passed {
            tracing::info!(check = check.name, "{}", check.detail);
        } else {
            tracing::warn!(check = check.name, "{}", check.detail);
        }
    }
    report
}
