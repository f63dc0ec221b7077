use staffmetrics_store::StoreError;
use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// A unique key could not be satisfied under the active collision policy,
    /// or the store rejected a key on insert.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for GenerationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { entity, key } => GenerationError::Duplicate { entity, key },
            other => GenerationError::Store(other),
        }
    }
}
