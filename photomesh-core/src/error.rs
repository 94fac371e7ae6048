//! Error types for photomesh

use thiserror::Error;

/// Main error type for photomesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Sink error: {0}")]
    Sink(String),
}

impl Error {
    /// Check `actual` against `expected`, producing a [`Error::DimensionMismatch`] on failure
    pub fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::DimensionMismatch { what, expected, actual })
        }
    }
}

/// Result type alias for photomesh operations
pub type Result<T> = std::result::Result<T, Error>;
