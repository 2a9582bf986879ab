//! Error types for zcsv

use thiserror::Error;

/// Result type alias for zcsv operations
pub type Result<T> = std::result::Result<T, ZcsvError>;

/// Error types that can occur in zcsv
#[derive(Debug, Error)]
pub enum ZcsvError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File extension does not map to a supported codec
    #[error("unsupported file extension: {extension:?} (expected .gz or .zst)")]
    UnsupportedExtension {
        /// Extension found on the path, empty if the path had none
        extension: String,
    },

    /// Open mode is not one of "read" or "write"
    #[error("unsupported mode: {mode:?} (expected read or write)")]
    UnsupportedMode {
        /// Mode string supplied by the caller
        mode: String,
    },

    /// CSV parse or serialize error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
