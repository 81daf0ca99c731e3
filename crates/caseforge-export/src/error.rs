//! Error types for exports

use thiserror::Error;

/// Errors that can occur while exporting records
#[derive(Error, Debug)]
pub enum ExportError {
    /// Format name not recognised
    #[error("Invalid format: {0}")]
    UnknownFormat(String),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error while assembling a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Spreadsheet packaging error
    #[error("Spreadsheet error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// PDF assembly error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Issue tracker or test-management API error
    #[error("{0}")]
    Tracker(String),
}
