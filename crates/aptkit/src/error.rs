//! Error types for apt operations.
//!
//! apt-get reports everything through exit status and stderr, so errors
//! are categorised from its output to decide whether a retry makes sense.

use thiserror::Error;

/// Categories of apt errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable)
    Network,
    /// Another process holds the dpkg lock (transient, retryable)
    Locked,
    /// Package not found in any configured source
    NotFound,
    /// Unmet dependencies or conflicts
    Conflict,
    /// Permission denied (not running as root)
    Permission,
    /// apt-get not installed
    AptNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Locked)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Locked => "Package database locked",
            Self::NotFound => "Package not found",
            Self::Conflict => "Dependency conflict",
            Self::Permission => "Permission denied",
            Self::AptNotFound => "apt not installed",
            Self::Other => "Unexpected error",
        }
    }
}

/// Errors that can occur during apt operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error while fetching indexes or archives
    #[error("network error: {message}")]
    Network { message: String },

    /// The dpkg lock is held by another process
    #[error("package database locked: {message}")]
    Locked { message: String },

    /// Package unknown to every configured source
    #[error("package not found: {name}")]
    NotFound { name: String },

    /// Unmet dependencies, held or conflicting packages
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission { message: String },

    /// apt-get is not installed or not found in PATH
    #[error("apt-get not found; this backend needs a Debian-based system")]
    AptNotFound,

    /// Command exited unsuccessfully for another reason
    #[error("command failed: {message}")]
    CommandFailed { message: String, stderr: String },

    /// The command could not be executed at all
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::Locked { .. } => ErrorCategory::Locked,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::AptNotFound => ErrorCategory::AptNotFound,
            Error::CommandFailed { .. } | Error::Spawn { .. } => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the command never ran, as opposed to ran and failed.
    pub fn is_hard(&self) -> bool {
        matches!(self, Error::AptNotFound | Error::Spawn { .. })
    }

    /// Create an error from apt-get output.
    ///
    /// Analyzes stderr to categorize the error appropriately. Matching is on
    /// apt's untranslated messages.
    pub fn from_apt_output(stderr: &str, package_name: Option<&str>) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let message = stderr.trim().to_string();

        // Permission errors (apt reports these as lock failures too)
        if stderr_lower.contains("are you root")
            || stderr_lower.contains("permission denied")
        {
            return Error::Permission { message };
        }

        // Lock contention
        if stderr_lower.contains("could not get lock")
            || stderr_lower.contains("unable to acquire the dpkg frontend lock")
            || stderr_lower.contains("unable to lock the administration directory")
        {
            return Error::Locked { message };
        }

        // Network errors
        if stderr_lower.contains("temporary failure resolving")
            || stderr_lower.contains("could not resolve")
            || stderr_lower.contains("failed to fetch")
            || stderr_lower.contains("connection timed out")
            || stderr_lower.contains("connection failed")
            || stderr_lower.contains("unable to connect")
            || stderr_lower.contains("some index files failed to download")
        {
            return Error::Network { message };
        }

        // Not found errors
        if stderr_lower.contains("unable to locate package")
            || stderr_lower.contains("has no installation candidate")
            || stderr_lower.contains("no packages found matching")
        {
            return Error::NotFound {
                name: package_name.unwrap_or("unknown").to_string(),
            };
        }

        // Conflicts
        if stderr_lower.contains("unmet dependencies")
            || stderr_lower.contains("held broken packages")
            || stderr_lower.contains("conflicts with")
        {
            return Error::Conflict { message };
        }

        // Default to command failed
        Error::CommandFailed {
            message: format!(
                "apt-get failed{}",
                package_name
                    .map(|n| format!(" for {n}"))
                    .unwrap_or_default()
            ),
            stderr: message,
        }
    }
}

/// Result type for apt operations.
pub type Result<T> = std::result::Result<T, Error>;
