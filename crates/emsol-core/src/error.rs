//! Unified error types for the emsol workspace
//!
//! This module provides a common error type [`EmsolError`] that can represent
//! errors from any part of the system. Both the graph layer and the model
//! layer return [`EmsolResult`] so failures compose with `?` across crate
//! boundaries.
//!
//! # Example
//!
//! ```ignore
//! use emsol_core::{EmsolError, EmsolResult};
//!
//! fn build_and_solve(path: &str) -> EmsolResult<()> {
//!     let system = load_system(path)?;
//!     solve(&system)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all emsol operations.
///
/// Construction-time invariant violations, declaration mismatches, and
/// caller-supplied objective selection errors are all fatal and carry a
/// message naming the offending attribute or value. Suspicious-but-valid
/// configurations are not errors; they are logged as warnings instead.
#[derive(Error, Debug)]
pub enum EmsolError {
    /// I/O errors (file access while loading or exporting)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Flow/node attribute validation errors (mutually exclusive
    /// attributes, bad sequence lengths, missing capacity)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Grouping errors (duplicate node labels, malformed group requests)
    #[error("Grouping error: {0}")]
    Grouping(String),

    /// Substance declaration mismatches between flows and their system
    #[error("Substance error: {0}")]
    Substance(String),

    /// Time index errors (non-positive step, overflowing increment)
    #[error("Time index error: {0}")]
    TimeIndex(String),

    /// Objective selection errors raised before any solver call
    #[error("Objective error: {0}")]
    Objective(String),

    /// Solver boundary errors (unknown backend, backend failure)
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors (unknown or legacy keys, unresolvable refs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using EmsolError.
pub type EmsolResult<T> = Result<T, EmsolError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for EmsolError {
    fn from(err: anyhow::Error) -> Self {
        EmsolError::Other(err.to_string())
    }
}

// Conversion from string-like types for convenience
impl From<String> for EmsolError {
    fn from(s: String) -> Self {
        EmsolError::Other(s)
    }
}

impl From<&str> for EmsolError {
    fn from(s: &str) -> Self {
        EmsolError::Other(s.to_string())
    }
}

// JSON parsing errors from the configuration layer
impl From<serde_json::Error> for EmsolError {
    fn from(err: serde_json::Error) -> Self {
        EmsolError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmsolError::Objective("no bucket named \"eco\"".into());
        assert!(err.to_string().contains("Objective error"));
        assert!(err.to_string().contains("eco"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EmsolError = io_err.into();
        assert!(matches!(err, EmsolError::Io(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn example_fn() -> EmsolResult<i32> {
            Ok(42)
        }
        assert_eq!(example_fn().unwrap(), 42);
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> EmsolResult<()> {
            Err(EmsolError::Validation("test".into()))
        }

        fn outer() -> EmsolResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
