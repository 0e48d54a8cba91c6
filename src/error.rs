//! Error types for identifier decoding and registry data loading.

use std::io;
use thiserror::Error;

/// Result type alias for prodinfo operations.
pub type Result<T> = std::result::Result<T, ProdInfoError>;

/// Errors that can occur while decoding identifiers or loading registry data.
#[derive(Error, Debug)]
pub enum ProdInfoError {
    /// An identifier was not 32 characters long or was not hexadecimal.
    #[error("Invalid identifier format: {0}")]
    InvalidFormat(String),

    /// I/O error occurred while reading a registry export.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A registry export file is malformed.
    #[error("Invalid registry export at line {line}: {message}")]
    InvalidRegFile {
        /// 1-based line number where the problem starts.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Text could not be decoded in the detected encoding.
    #[error("Invalid {encoding} text: {context}")]
    Encoding {
        /// Name of the encoding that failed.
        encoding: &'static str,
        /// What was being decoded.
        context: String,
    },
}

impl ProdInfoError {
    /// Creates a format error with detailed context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use prodinfo::error::ProdInfoError;
    /// let err = ProdInfoError::format_error(format!("expected 32 characters, got {}", 31));
    /// assert!(matches!(err, ProdInfoError::InvalidFormat(_)));
    /// assert!(err.to_string().contains("32 characters"));
    /// ```
    pub fn format_error(message: String) -> Self {
        Self::InvalidFormat(message)
    }

    /// Creates a registry export error for the given 1-based line number.
    pub fn reg_file(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidRegFile {
            line,
            message: message.into(),
        }
    }
}
