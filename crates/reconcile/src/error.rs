//! Error types for package list reconciliation.
//!
//! Only parse failures and persistence faults are errors. A backend
//! operation that simply did not succeed is reported as an outcome, not
//! through this type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while parsing identifiers, loading or saving the
/// package list, or querying a backend during sync.
#[derive(Debug, Error)]
pub enum Error {
    /// Identifier names a scheme no backend is registered for
    #[error("unknown backend '{scheme}' in package identifier '{input}'")]
    UnknownBackend {
        /// The offending scheme
        scheme: String,
        /// The full identifier text as given
        input: String,
    },

    /// Identifier text is malformed (empty name, whitespace, ...)
    #[error("invalid package identifier '{input}': {reason}")]
    InvalidIdentifier {
        /// The full identifier text as given
        input: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Reading the package list failed
    #[error("failed to read package list {}: {source}", path.display())]
    StoreRead {
        /// Path of the list file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Writing the package list failed
    #[error("failed to write package list {}: {source}", path.display())]
    StoreWrite {
        /// Path of the list file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A backend query failed hard (not a soft operation failure)
    #[error("backend '{scheme}' failed: {source}")]
    Backend {
        /// Scheme of the failing backend
        scheme: String,
        /// Underlying error reported by the backend
        source: anyhow::Error,
    },

    /// The worker pool for parallel execution could not be built
    #[error("failed to create worker pool: {0}")]
    ThreadPool(String),
}

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend_message_names_scheme() {
        let err = Error::UnknownBackend {
            scheme: "foo".to_string(),
            input: "foo://bar".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown backend 'foo' in package identifier 'foo://bar'"
        );
    }

    #[test]
    fn test_store_errors() {
        let err = Error::StoreWrite {
            path: PathBuf::from("/var/lib/unip/packages.list"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/var/lib/unip/packages.list"));
    }
}
