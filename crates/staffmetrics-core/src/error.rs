use thiserror::Error;

use crate::validation::ValidationErrors;

/// Core error type shared across staffmetrics crates.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more fields failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// A value is not part of a known category vocabulary.
    #[error("unknown {kind}: {value}")]
    UnknownCategory { kind: &'static str, value: String },
}

/// Convenience alias for results returned by staffmetrics crates.
pub type Result<T> = std::result::Result<T, Error>;
