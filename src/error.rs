use fib_core::FibError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Fib(#[from] FibError),

    #[error("invalid method `{0}`")]
    InvalidMethod(String),

    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("`{command}` failed: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    ExitStatus {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from `{command}`: {output}")]
    Output { command: String, output: String },

    #[error("table error: {0}")]
    Table(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
