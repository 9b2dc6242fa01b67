use thiserror::Error;

/// Failures while writing the results file. All of them end the run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("output io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv flush failed: {0}")]
    Flush(String),
}
