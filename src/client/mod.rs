//! DataStore query construction and dispatch.
//!
//! - [`build_url`]: deterministic URL assembly from a base, parameters and a mode tag
//! - [`Dispatcher`]: one GET per URL, body parsed to JSON, optional response cache
//! - [`ResponseCache`]: in-memory memoization keyed by URL
//! - [`CredentialProvider`]: hook consulted before file downloads

mod auth;
mod builder;
mod cache;
mod dispatcher;

pub use auth::{Anonymous, CredentialProvider};
pub use builder::build_url;
pub use cache::{CacheResult, ResponseCache};
pub use dispatcher::Dispatcher;

use std::path::PathBuf;

/// Errors that can occur when querying the DataStore or writing its results
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    /// Connection failure or timeout
    #[error("Network error requesting {url}: {message}")]
    Network { url: String, message: String },

    /// Non-success HTTP status where the status is checked
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// Body is not valid JSON or not the expected shape
    #[error("Could not parse response from {url}: {message}")]
    ResponseParse { url: String, message: String },

    /// Fewer file descriptors than a package needs
    #[error("Expected {expected} file descriptors, found {found}")]
    MissingDescriptor { expected: usize, found: usize },

    /// Search returned no records to derive CSV headers from
    #[error("No search results to export for '{0}'")]
    EmptyResult(String),

    /// Mode tag outside the recognized set
    #[error("Unrecognized query mode tag: {0:?}")]
    UnrecognizedMode(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Filesystem error
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DatastoreError {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatastoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a reqwest error with the URL being requested
    pub(crate) fn network(url: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out ({})", err)
        } else {
            err.to_string()
        };
        DatastoreError::Network {
            url: url.to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = DatastoreError::HttpStatus {
            url: "http://x/Reference/1/DigitalFiles".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 from http://x/Reference/1/DigitalFiles");

        let err = DatastoreError::UnrecognizedMode("Search".to_string());
        assert_eq!(err.to_string(), "Unrecognized query mode tag: \"Search\"");

        let err = DatastoreError::io(
            "/tmp/out.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/out.csv"));
    }
}
