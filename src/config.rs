use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepConfig {
    #[serde(default = "default_timing_max_n")]
    pub timing_max_n: u32,
    #[serde(default = "default_ops_max_n")]
    pub ops_max_n: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            timing_max_n: default_timing_max_n(),
            ops_max_n: default_ops_max_n(),
        }
    }
}

fn default_timing_max_n() -> u32 {
    40
}

fn default_ops_max_n() -> u32 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeoutConfig {
    #[serde(default = "default_recursive_secs")]
    pub recursive_secs: u64,
    #[serde(default = "default_secs")]
    pub default_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            recursive_secs: default_recursive_secs(),
            default_secs: default_secs(),
        }
    }
}

fn default_recursive_secs() -> u64 {
    10
}

fn default_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "info".into()
}

/// Where an implementation's data points come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunnerMode {
    /// Spawn the command once per data point and kill it on timeout.
    #[default]
    Subprocess,
    /// Call the strategies in this process with a cooperative deadline.
    InProcess,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImplementationConfig {
    pub name: String,
    #[serde(default)]
    pub mode: RunnerMode,
    /// Program and leading arguments; `<method> <n>` are appended. Empty
    /// means the running `fib-bench` executable.
    #[serde(default)]
    pub command: Vec<String>,
}

impl ImplementationConfig {
    pub fn this_binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: RunnerMode::Subprocess,
            command: Vec::new(),
        }
    }
}

fn default_implementations() -> Vec<ImplementationConfig> {
    vec![ImplementationConfig::this_binary("rust")]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchConfig {
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_implementations")]
    pub implementations: Vec<ImplementationConfig>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sweep: SweepConfig::default(),
            timeouts: TimeoutConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            implementations: default_implementations(),
        }
    }
}

impl BenchConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            BenchError::Config(format!("failed to read `{}`: {err}", path.display()))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(raw)
            .map_err(|err| BenchError::Config(format!("failed to parse configuration: {err}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads `path` when given and present, otherwise the defaults, then
    /// applies `FIB_BENCH_*` environment overrides.
    pub fn from_env_or_file(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                return Err(BenchError::Config(format!(
                    "configuration file `{}` does not exist",
                    path.display()
                )))
            }
            None => Self::default(),
        };
        if let Ok(dir) = env::var("FIB_BENCH_OUTPUT_DIR") {
            cfg.output.dir = PathBuf::from(dir);
        }
        if let Ok(raw) = env::var("FIB_BENCH_TIMING_MAX_N") {
            if let Ok(parsed) = raw.parse::<u32>() {
                cfg.sweep.timing_max_n = parsed;
            }
        }
        if let Ok(raw) = env::var("FIB_BENCH_OPS_MAX_N") {
            if let Ok(parsed) = raw.parse::<u32>() {
                cfg.sweep.ops_max_n = parsed;
            }
        }
        if let Ok(raw) = env::var("FIB_BENCH_RECURSIVE_TIMEOUT_SECS") {
            if let Ok(parsed) = raw.parse::<u64>() {
                cfg.timeouts.recursive_secs = parsed;
            }
        }
        if let Ok(raw) = env::var("FIB_BENCH_DEFAULT_TIMEOUT_SECS") {
            if let Ok(parsed) = raw.parse::<u64>() {
                cfg.timeouts.default_secs = parsed;
            }
        }
        if let Ok(raw) = env::var("FIB_BENCH_MODE") {
            let mode = match raw.to_ascii_lowercase().as_str() {
                "in_process" | "in-process" => RunnerMode::InProcess,
                _ => RunnerMode::Subprocess,
            };
            for implementation in cfg.implementations.iter_mut() {
                implementation.mode = mode;
            }
        }
        if let Ok(raw) = env::var("FIB_BENCH_LOG_JSON") {
            if let Ok(parsed) = raw.parse::<bool>() {
                cfg.logging.json = parsed;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.implementations.is_empty() {
            return Err(BenchError::Config(
                "at least one implementation is required".into(),
            ));
        }
        for implementation in &self.implementations {
            if implementation.name.trim().is_empty() {
                return Err(BenchError::Config("implementation names cannot be empty".into()));
            }
            if implementation.mode == RunnerMode::InProcess && !implementation.command.is_empty() {
                return Err(BenchError::Config(format!(
                    "implementation `{}` runs in-process and cannot have a command",
                    implementation.name
                )));
            }
        }
        Ok(())
    }

    pub fn timings_path(&self, implementation: &str) -> PathBuf {
        self.output.dir.join(format!("timings_fib_{implementation}.csv"))
    }

    pub fn ops_path(&self, implementation: &str) -> PathBuf {
        self.output.dir.join(format!("ops_fib_{implementation}.csv"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = BenchConfig::from_toml("").unwrap();
        assert_eq!(cfg, BenchConfig::default());
        assert_eq!(cfg.sweep.timing_max_n, 40);
        assert_eq!(cfg.timeouts.recursive_secs, 10);
        assert_eq!(cfg.implementations.len(), 1);
    }

    #[test]
    fn loads_and_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[sweep]\ntiming_max_n=12\n[output]\ndir='out'\n\n[[implementations]]\nname='rust'\n\n[[implementations]]\nname='python'\ncommand=['python','fibonacci.py']"
        )
        .unwrap();

        env::set_var("FIB_BENCH_OPS_MAX_N", "7");
        let cfg = BenchConfig::from_env_or_file(Some(file.path())).unwrap();
        env::remove_var("FIB_BENCH_OPS_MAX_N");

        assert_eq!(cfg.sweep.timing_max_n, 12);
        assert_eq!(cfg.sweep.ops_max_n, 7);
        assert_eq!(cfg.output.dir, PathBuf::from("out"));
        assert_eq!(cfg.implementations[1].command, vec!["python", "fibonacci.py"]);
        assert_eq!(cfg.timings_path("python"), PathBuf::from("out/timings_fib_python.csv"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = BenchConfig::from_env_or_file(Some(Path::new("/nonexistent/fib.toml")));
        assert!(matches!(err, Err(BenchError::Config(_))));
    }

    #[test]
    fn in_process_with_command_is_rejected() {
        let raw = "[[implementations]]\nname='rust'\nmode='in_process'\ncommand=['x']";
        assert!(BenchConfig::from_toml(raw).is_err());
    }
}
