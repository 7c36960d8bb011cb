//! Error types for the PhysicianQA form filler

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PhysicianQA library
#[derive(Error, Debug)]
pub enum Error {
    /// The base template could not be fetched or read
    #[error("{message}")]
    TemplateLoad {
        /// User-facing message from the configuration
        message: String,
        /// Underlying cause (logged, not shown)
        detail: String,
    },

    /// Loading, copying, drawing or serializing one document failed
    #[error("{label}: {detail}")]
    PdfProcessing { label: String, detail: String },

    /// Building or writing the ZIP archive failed
    #[error("{label}: {detail}")]
    Archive { label: String, detail: String },

    /// Combining documents for printing failed
    #[error("{label}: {detail}")]
    Print { label: String, detail: String },

    /// Low-level PDF error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Configuration file could not be parsed
    #[error("Invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    /// Date parsing error
    #[error("Invalid date expression: {0}")]
    InvalidDateExpression(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Wrap any failure of a single fill under the processing label
    pub fn processing(label: &str, detail: impl std::fmt::Display) -> Self {
        Error::PdfProcessing {
            label: label.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn archive(label: &str, detail: impl std::fmt::Display) -> Self {
        Error::Archive {
            label: label.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn print(label: &str, detail: impl std::fmt::Display) -> Self {
        Error::Print {
            label: label.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_load_shows_message_only() {
        let err = Error::TemplateLoad {
            message: "Template missing".to_string(),
            detail: "404 Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Template missing");
    }

    #[test]
    fn test_processing_is_prefixed_with_label() {
        let err = Error::processing("Failed to create filled PDF", "bad xref");
        assert_eq!(err.to_string(), "Failed to create filled PDF: bad xref");
    }
}
