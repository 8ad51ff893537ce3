//! Error types for APT operations.
//!
//! Errors are categorized so the caller can tell transient failures
//! (network, dpkg lock held by another process) from fatal ones
//! (unknown package, distribution missing from the archive).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Categories of APT errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable)
    Network,
    /// Another process holds the dpkg/apt lock (transient, retryable)
    LockContention,
    /// Package or requested version not found in any configured source
    NotFound,
    /// The repository has no release for the requested distribution
    UnsupportedDistribution,
    /// Permission denied (not root, sudo refused)
    Permission,
    /// apt-get or dpkg-query missing from PATH
    AptNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::LockContention)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::LockContention => "Package database locked",
            Self::NotFound => "Package not found",
            Self::UnsupportedDistribution => "Unsupported distribution",
            Self::Permission => "Permission denied",
            Self::AptNotFound => "APT not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and the repository URI",
            Self::LockContention => {
                "Wait for the other package manager (apt, unattended-upgrades) to finish"
            }
            Self::NotFound => "Verify the package name and version, or add the repository first",
            Self::UnsupportedDistribution => {
                "Check that the repository publishes packages for this distribution"
            }
            Self::Permission => "Run as root or allow sudo for apt-get",
            Self::AptNotFound => "This tool targets Debian/Ubuntu systems with apt-get and dpkg",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Errors that can occur during APT operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error (connection, timeout, DNS, etc.)
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the failed network operation
        message: String,
    },

    /// The dpkg frontend lock is held by another process
    #[error("package database locked: {message}")]
    LockContention {
        /// Lock message reported by apt-get
        message: String,
    },

    /// Package (or the pinned version) not found
    #[error("package not found: {name}")]
    NotFound {
        /// Name of the package that could not be found
        name: String,
    },

    /// The repository does not publish the requested distribution
    #[error("unsupported distribution: {message}")]
    UnsupportedDistribution {
        /// Details from apt-get update
        message: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// Details about what permission was denied
        message: String,
    },

    /// A required APT tool is not installed or not in PATH
    #[error("{0} not found; this tool requires a Debian-based system")]
    AptNotFound(String),

    /// Could not write a sources list file
    #[error("failed to write {}: {source}", .path.display())]
    SourcesWrite {
        /// Path of the sources list file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Network { .. } => ErrorCategory::Network,
            Error::LockContention { .. } => ErrorCategory::LockContention,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::UnsupportedDistribution { .. } => ErrorCategory::UnsupportedDistribution,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::AptNotFound(_) => ErrorCategory::AptNotFound,
            Error::SourcesWrite { source, .. } | Error::Io(source)
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                ErrorCategory::Permission
            }
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Create an error from apt-get / dpkg output.
    ///
    /// Analyzes stderr to categorize the error appropriately. Lock contention
    /// is checked first: apt prints "Could not get lock" together with
    /// "Resource temporarily unavailable", which would otherwise look like a
    /// network failure.
    pub fn from_apt_output(stderr: &str, package_name: Option<&str>) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let message = stderr.trim().to_string();

        // Checked before lock contention: a non-root run fails to take the
        // same locks and apt words it the same way, plus "are you root?".
        if stderr_lower.contains("permission denied")
            || stderr_lower.contains("are you root")
            || stderr_lower.contains("operation not permitted")
            || stderr_lower.contains("a password is required")
        {
            return Error::Permission { message };
        }

        if stderr_lower.contains("could not get lock")
            || stderr_lower.contains("unable to lock")
            || stderr_lower.contains("unable to acquire the dpkg frontend lock")
            || stderr_lower.contains("is another process using it")
        {
            return Error::LockContention { message };
        }

        // Checked before network errors: a missing dist is reported as a
        // failed fetch with a 404.
        if stderr_lower.contains("does not have a release file")
            || (stderr_lower.contains("404") && stderr_lower.contains("release"))
            || stderr_lower.contains("no longer has a release file")
        {
            return Error::UnsupportedDistribution { message };
        }

        if stderr_lower.contains("could not resolve")
            || stderr_lower.contains("temporary failure resolving")
            || stderr_lower.contains("failed to fetch")
            || stderr_lower.contains("connection timed out")
            || stderr_lower.contains("connection refused")
            || stderr_lower.contains("connection failed")
            || stderr_lower.contains("network is unreachable")
            || stderr_lower.contains("hash sum mismatch")
            || stderr_lower.contains("some index files failed to download")
        {
            return Error::Network { message };
        }

        if stderr_lower.contains("unable to locate package")
            || stderr_lower.contains("has no installation candidate")
            || (stderr_lower.contains("version") && stderr_lower.contains("was not found"))
            || stderr_lower.contains("no packages found matching")
        {
            return Error::NotFound {
                name: package_name.unwrap_or("unknown").to_string(),
            };
        }

        Error::CommandFailed {
            message: format!(
                "apt command failed{}",
                package_name
                    .map(|n| format!(" for {n}"))
                    .unwrap_or_default()
            ),
            stderr: message,
        }
    }
}

/// Result type for APT operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::LockContention.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::UnsupportedDistribution.is_retryable());
        assert!(!ErrorCategory::Permission.is_retryable());
    }

    #[test]
    fn test_from_apt_output_lock() {
        let err = Error::from_apt_output(
            "E: Could not get lock /var/lib/dpkg/lock-frontend. It is held by process 1234 (apt-get)\n\
             E: Unable to acquire the dpkg frontend lock (/var/lib/dpkg/lock-frontend), is another process using it?",
            Some("ocaml"),
        );
        assert_eq!(err.category(), ErrorCategory::LockContention);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_apt_output_network() {
        let err = Error::from_apt_output(
            "W: Failed to fetch http://ppa.launchpad.net/avsm/ppa/ubuntu/dists/precise/InRelease  Temporary failure resolving 'ppa.launchpad.net'",
            None,
        );
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_apt_output_not_found() {
        let err = Error::from_apt_output("E: Unable to locate package ocamll", Some("ocamll"));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "package not found: ocamll");
    }

    #[test]
    fn test_from_apt_output_version_not_found() {
        let err = Error::from_apt_output(
            "E: Version '9.9' for 'ocaml' was not found",
            Some("ocaml"),
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_from_apt_output_unsupported_distribution() {
        let err = Error::from_apt_output(
            "E: The repository 'http://ppa.launchpad.net/avsm/ppa/ubuntu jammy Release' does not have a Release file.",
            None,
        );
        assert_eq!(err.category(), ErrorCategory::UnsupportedDistribution);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_apt_output_permission() {
        let err = Error::from_apt_output(
            "E: Could not open lock file /var/lib/dpkg/lock-frontend - open (13: Permission denied)\n\
             E: Unable to acquire the dpkg frontend lock (/var/lib/dpkg/lock-frontend), are you root?",
            Some("m4"),
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_apt_output_permission_precise() {
        let err = Error::from_apt_output(
            "E: Could not open lock file /var/lib/dpkg/lock - open (13: Permission denied)\n\
             E: Unable to lock the administration directory (/var/lib/dpkg/), are you root?",
            Some("ocaml"),
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_apt_output_fallback() {
        let err = Error::from_apt_output("E: Sub-process /usr/bin/dpkg returned an error code (1)", Some("m4"));
        assert_eq!(err.category(), ErrorCategory::Other);
        assert!(err.to_string().contains("for m4"));
    }

    #[test]
    fn test_io_permission_denied_is_permission() {
        let err = Error::SourcesWrite {
            path: PathBuf::from("/etc/apt/sources.list.d/x.list"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.category(), ErrorCategory::Permission);
    }
}
