//! Error types for the Lexiclass library.
//!
//! All fallible operations return [`Result`], whose error type is
//! [`LexiclassError`]. The variants follow the three kinds of failure a
//! classifier can run into:
//!
//! - configuration errors (invalid feature settings, negative Laplace
//!   correctors, merging dictionaries built with different settings),
//! - resource errors (persisted dictionary already exists, I/O failures,
//!   corrupted index files, reading from a closed dictionary),
//! - analysis errors raised by tokenizers.
//!
//! Missing evidence (unknown terms, empty documents, empty dictionaries) is
//! never reported as an error.
//!
//! # Examples
//!
//! ```
//! use lexiclass::error::{LexiclassError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(LexiclassError::invalid_config("laplace corrector must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Lexiclass operations.
#[derive(Error, Debug)]
pub enum LexiclassError {
    /// I/O errors (file operations, memory mapping).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration detected at construction or merge time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Persisted index format errors (bad magic, checksum mismatch, truncation).
    #[error("Index error: {0}")]
    Index(String),

    /// Analysis-related errors (tokenization, filtering).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with LexiclassError.
pub type Result<T> = std::result::Result<T, LexiclassError>;

impl LexiclassError {
    /// Create a new configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LexiclassError::Config(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        LexiclassError::Storage(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        LexiclassError::Index(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        LexiclassError::Analysis(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LexiclassError::Other(msg.into())
    }

    /// Whether this error was caused by invalid configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, LexiclassError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = LexiclassError::invalid_config("min_ngram_length must be >= 1");
        assert_eq!(
            error.to_string(),
            "Configuration error: min_ngram_length must be >= 1"
        );
        assert!(error.is_config());

        let error = LexiclassError::index("bad magic");
        assert_eq!(error.to_string(), "Index error: bad magic");
        assert!(!error.is_config());

        let error = LexiclassError::analysis("Test analysis error");
        assert_eq!(error.to_string(), "Analysis error: Test analysis error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = LexiclassError::from(io_error);

        match error {
            LexiclassError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
