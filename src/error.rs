//! Error types for bookpress operations.

use thiserror::Error;

/// Errors that can occur while validating or exporting a book.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("PDF error: {0}")]
    Pdf(String),

    /// A font supplied for PDF embedding could not be used.
    #[error("Font error: {0}")]
    Font(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The book cannot be exported as given (missing title, nothing to render).
    #[error("Cannot export: {0}")]
    Precondition(String),

    /// Another export is still running on the same service.
    #[error("An export is already in progress")]
    Busy,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid cover image: {0}")]
    InvalidCover(String),

    #[error("Export task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
