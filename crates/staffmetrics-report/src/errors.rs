use staffmetrics_store::StoreError;
use thiserror::Error;

/// Errors emitted while building reports or exports.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
