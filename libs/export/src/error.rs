//! Custom error types for report generation

use thiserror::Error;

/// Error raised while producing a CSV or PDF export
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV serialization failed
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV writer produced bytes that are not UTF-8
    #[error("CSV export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The logo could not be decoded
    #[error("Logo image error: {0}")]
    Image(#[from] image::ImageError),

    /// Low level I/O failure (compression, buffers)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with ExportError
pub type ExportResult<T> = Result<T, ExportError>;
