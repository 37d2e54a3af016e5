//! CLI error types.

use thiserror::Error;
use upwatch_core::WatchError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The polling engine failed.
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display_config() {
        let err = CliError::Config("missing API URL".into());
        assert_eq!(err.to_string(), "configuration error: missing API URL");
    }

    #[test]
    fn cli_error_wraps_watch_error_transparently() {
        let err = CliError::from(WatchError::NotFound("api".into()));
        assert_eq!(err.to_string(), "probe not found: api");
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
