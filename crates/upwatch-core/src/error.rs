//! Error types for the polling engine.
//!
//! Errors fall into two groups. Configuration errors ([`WatchError`] variants
//! other than `Fetch` and `Render`) are detected before the poll loop starts
//! and are always fatal. Transient errors ([`FetchError`], [`RenderError`])
//! are reported per tick while the loop keeps running.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the polling engine.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The requested poll interval is below the one second floor.
    #[error("interval {requested:?} is below the minimum of {minimum:?}")]
    IntervalTooShort {
        /// Interval the operator asked for.
        requested: Duration,
        /// Smallest accepted interval.
        minimum: Duration,
    },

    /// A time expression could not be parsed.
    #[error("invalid time expression '{input}': {reason}")]
    InvalidTimeExpr {
        /// The raw expression.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The lower bound of a time window is not before the upper bound.
    #[error("invalid time window: --since {from} must be before --until {to}")]
    InvalidWindow {
        /// Lower bound as supplied.
        from: String,
        /// Upper bound as supplied.
        to: String,
    },

    /// A status or outcome filter value is not recognised.
    #[error("invalid {kind} '{value}': expected one of {expected}")]
    InvalidFilter {
        /// What was being parsed (`status`, `outcome`).
        kind: &'static str,
        /// The rejected value.
        value: String,
        /// Comma-separated accepted values.
        expected: &'static str,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A probe name matched more than one probe.
    #[error(
        "'{query}' matches {total} probes: {}{}; use the probe ID instead",
        .candidates.join(", "),
        more_suffix(*.total, .candidates.len())
    )]
    Ambiguous {
        /// Name the operator supplied.
        query: String,
        /// Up to five `name (id)` descriptions.
        candidates: Vec<String>,
        /// Number of matching probes.
        total: usize,
    },

    /// No probe matched the identifier.
    #[error("probe not found: {0}")]
    NotFound(String),

    /// The target could not be resolved because the backend call failed.
    #[error("failed to resolve probe '{query}': {source}")]
    Resolve {
        /// Identifier being resolved.
        query: String,
        /// Underlying failure.
        #[source]
        source: FetchError,
    },

    /// A fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Rendering a batch failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

fn more_suffix(total: usize, shown: usize) -> String {
    if total > shown {
        format!(" and {} more", total - shown)
    } else {
        String::new()
    }
}

/// Failure of a single call to the status provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The call did not finish within the per-call timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with an error status.
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// The requested item does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Failure to render a batch.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a batch failed.
    #[error("serialization failed: {0}")]
    Serialize(String),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_error_names_both_durations() {
        let err = WatchError::IntervalTooShort {
            requested: Duration::from_millis(999),
            minimum: Duration::from_secs(1),
        };
        assert_eq!(err.to_string(), "interval 999ms is below the minimum of 1s");
    }

    #[test]
    fn ambiguous_lists_candidates() {
        let err = WatchError::Ambiguous {
            query: "api".into(),
            candidates: vec!["api-gateway (a)".into(), "api-server (b)".into()],
            total: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("api-gateway (a), api-server (b)"));
        assert!(msg.contains("use the probe ID instead"));
        assert!(!msg.contains("more"));
    }

    #[test]
    fn ambiguous_counts_hidden_candidates() {
        let err = WatchError::Ambiguous {
            query: "web".into(),
            candidates: vec!["a".into(); 5],
            total: 7,
        };
        assert!(err.to_string().contains("and 2 more"));
    }

    #[test]
    fn fetch_error_display() {
        let err = FetchError::Server {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "server returned 503: unavailable");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WatchError>();
    }
}
