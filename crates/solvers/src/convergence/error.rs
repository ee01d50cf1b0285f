use super::ConfigError;

/// Errors that can occur when running a convergence test.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("convergence test used before start()")]
    NotStarted,

    #[error("increment has {x} entries but unbalance has {b}")]
    SizeMismatch { x: usize, b: usize },

    #[error("invalid convergence test config: {0}")]
    Config(#[from] ConfigError),
}
