use thiserror::Error;

pub type Result<T> = std::result::Result<T, FibError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FibError {
    #[error("index must be non-negative, got {0}")]
    NegativeIndex(i64),

    #[error("index {index} exceeds the largest representable term ({max})")]
    IndexOutOfRange { index: u64, max: u32 },

    #[error("deadline exceeded while computing F({0})")]
    DeadlineExceeded(u32),

    #[error("unknown strategy `{0}`")]
    UnknownStrategy(String),
}
