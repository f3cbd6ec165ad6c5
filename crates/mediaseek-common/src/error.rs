//! Common error types used throughout mediaseek.

/// Common error type for mediaseek.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input was provided, such as an unknown format name or a path
    /// whose extension maps to no container.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_input("unknown container");
        assert_eq!(err.to_string(), "Invalid input: unknown container");
    }
}
