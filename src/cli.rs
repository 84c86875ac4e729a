use std::io::Write;
use std::path::{Path, PathBuf};

use fib_core::{check_series_len, index_from_i64, FibError, MAX_INDEX};

use crate::chart;
use crate::collector::Collector;
use crate::config::BenchConfig;
use crate::error::Result;
use crate::method::{self, Method};
use crate::telemetry::init_tracing;
use crate::verify;

pub const USAGE: &str = "Usage: fib-bench <method> <n>";

/// What the arguments ask for.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Usage,
    InvalidMethod(String),
    Measure { method: Method, n: u32 },
    Collect { config: Option<PathBuf> },
    Chart { config: Option<PathBuf> },
    Verify { config: Option<PathBuf> },
}

/// Parses arguments without the program name. The index must be an integer
/// before the method is looked at, so `bogus abc` is a usage error rather
/// than an invalid method. Its range is checked only once the method is
/// known: timings accept F(0..=93), printers list up to 94 terms.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let config = || args.get(1).map(PathBuf::from);
    match args.first().map(String::as_str) {
        Some("collect") => return Ok(Invocation::Collect { config: config() }),
        Some("chart") => return Ok(Invocation::Chart { config: config() }),
        Some("verify") => return Ok(Invocation::Verify { config: config() }),
        _ => {}
    }
    let (Some(method), Some(raw_n)) = (args.first(), args.get(1)) else {
        return Ok(Invocation::Usage);
    };
    let Ok(signed) = raw_n.trim().parse::<i64>() else {
        return Ok(Invocation::Usage);
    };
    let Ok(method) = method.parse::<Method>() else {
        return Ok(Invocation::InvalidMethod(method.clone()));
    };
    let n = match method {
        Method::Time(_) => index_from_i64(signed)?,
        Method::Print(_) => series_len_from_i64(signed)?,
    };
    Ok(Invocation::Measure { method, n })
}

fn series_len_from_i64(n: i64) -> Result<u32> {
    if n < 0 {
        return Err(FibError::NegativeIndex(n).into());
    }
    let len = u32::try_from(n).map_err(|_| FibError::IndexOutOfRange {
        index: n as u64,
        max: MAX_INDEX,
    })?;
    Ok(check_series_len(len)?)
}

fn load_config(path: Option<&Path>) -> Result<BenchConfig> {
    let config = BenchConfig::from_env_or_file(path)?;
    if let Err(err) = init_tracing(&config.logging) {
        eprintln!("logging disabled: {err}");
    }
    Ok(config)
}

/// Runs the command line and returns the process exit code. All output,
/// errors included, goes to `out`.
pub async fn run(args: &[String], out: &mut impl Write) -> u8 {
    match try_run(args, out).await {
        Ok(code) => code,
        Err(err) => {
            let _ = writeln!(out, "Error: {err}");
            1
        }
    }
}

/// Flushes `out` and folds a failed flush into the exit code, since a
/// truncated stdout is a failed measurement.
pub fn finish(out: &mut impl Write, code: u8) -> u8 {
    match out.flush() {
        Ok(()) => code,
        Err(err) => {
            eprintln!("failed to flush stdout: {err}");
            1
        }
    }
}

async fn try_run(args: &[String], out: &mut impl Write) -> Result<u8> {
    match parse_args(args)? {
        Invocation::Usage => {
            writeln!(out, "{USAGE}")?;
            writeln!(out, "       fib-bench collect|chart|verify [config.toml]")?;
            Ok(1)
        }
        Invocation::InvalidMethod(name) => {
            tracing::debug!(method = %name, "rejected method");
            writeln!(out, "Invalid method")?;
            Ok(0)
        }
        Invocation::Measure { method, n } => {
            method::execute(method, n, None, out)?;
            Ok(0)
        }
        Invocation::Collect { config } => {
            let config = load_config(config.as_deref())?;
            let collector = Collector::new(config);
            for summary in collector.collect_all().await? {
                writeln!(
                    out,
                    "{}: {} data points, {} TIMEOUT, {} ERROR -> {}, {}",
                    summary.implementation,
                    summary.report.data_points,
                    summary.report.timeouts,
                    summary.report.errors,
                    summary.timings_path.display(),
                    summary.ops_path.display()
                )?;
            }
            Ok(0)
        }
        Invocation::Chart { config } => {
            let config = load_config(config.as_deref())?;
            for path in chart::render_all(&config).await? {
                writeln!(out, "{}", path.display())?;
            }
            Ok(0)
        }
        Invocation::Verify { config } => {
            let config = load_config(config.as_deref())?;
            let report = verify::verify(&config).await;
            write!(out, "{report}")?;
            Ok(if report.all_passed() { 0 } else { 1 })
        }
    }
}
