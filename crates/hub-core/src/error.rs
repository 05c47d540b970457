//! Error handling for hub core primitives.

use thiserror::Error;

/// Result type alias using the hub core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by core configuration handling.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value is out of its permitted range.
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_message() {
        let err = Error::Config("response ceiling must be non-zero".to_string());
        assert!(err.to_string().contains("response ceiling"));
    }
}
