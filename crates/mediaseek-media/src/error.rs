//! Error types for mediaseek-media.

use std::io;
use thiserror::Error;

/// Result type for mediaseek-media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for container parsing.
///
/// Every variant aborts the parse that raised it; no partially built index is
/// ever returned.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the backing source failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read or slice fell outside the bounds of its region.
    #[error(
        "Bounds violation: requested [{requested_start}, {requested_end}) in [{available_start}, {available_end})"
    )]
    BoundsViolation {
        requested_start: u64,
        requested_end: u64,
        available_start: u64,
        available_end: u64,
    },

    /// Invalid variable-length integer or ill-formed box/element header.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// A structure the container must carry is absent.
    #[error("Missing required element: {0}")]
    MissingRequiredElement(&'static str),

    /// A version, flag or layout combination the parser does not implement.
    #[error("Unsupported: {0}")]
    UnsupportedVariant(String),
}

impl Error {
    /// Create a bounds violation for `[start, end)` against `[available_start, available_end)`.
    pub fn bounds(start: u64, end: u64, available_start: u64, available_end: u64) -> Self {
        Self::BoundsViolation {
            requested_start: start,
            requested_end: end,
            available_start,
            available_end,
        }
    }

    /// Create a malformed header error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedHeader(msg.into())
    }

    /// Create an unsupported variant error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedVariant(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_display_names_both_ranges() {
        let err = Error::bounds(10, 20, 0, 15);
        assert_eq!(
            err.to_string(),
            "Bounds violation: requested [10, 20) in [0, 15)"
        );
    }

    #[test]
    fn test_constructors() {
        assert!(matches!(Error::malformed("x"), Error::MalformedHeader(_)));
        assert!(matches!(Error::unsupported("y"), Error::UnsupportedVariant(_)));
        assert_eq!(
            Error::MissingRequiredElement("moov").to_string(),
            "Missing required element: moov"
        );
    }
}
