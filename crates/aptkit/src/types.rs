//! Core types for APT package management.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Installed state of a package as reported by dpkg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PackageState {
    /// Not installed (or only configuration files remain)
    Absent,
    /// Installed at the given version
    Installed {
        /// Full Debian version string
        version: String,
    },
}

impl PackageState {
    /// Installed version, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Installed { version } => Some(version),
        }
    }

    /// Whether the package is installed at any version.
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }
}

/// An APT source to register.
///
/// Borrowed view so callers can pass their own repository model without
/// cloning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceEntry<'a> {
    /// Identifier, used as the `.list` file name
    pub id: &'a str,
    /// Archive root URI
    pub uri: &'a str,
    /// Distribution (suite) name, e.g. `precise`
    pub distribution: &'a str,
    /// Archive components, e.g. `main`
    pub components: &'a [String],
    /// Also register a `deb-src` line
    pub include_source: bool,
}

/// Adapter-wide options for the APT adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptOptions {
    /// Pass `--force-yes` to apt-get (install unauthenticated packages)
    pub force_yes: bool,
    /// Directory holding `.list` files
    pub sources_dir: PathBuf,
    /// Prefix mutating commands with `sudo`
    pub use_sudo: bool,
    /// Run `apt-get update` after adding a source
    pub update_after_add: bool,
}

impl Default for AptOptions {
    fn default() -> Self {
        Self {
            force_yes: false,
            sources_dir: PathBuf::from("/etc/apt/sources.list.d"),
            use_sudo: false,
            update_after_add: true,
        }
    }
}

/// Configuration for retry logic.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        // Never negative or NaN, whatever the factor; `Duration` would panic.
        let capped = delay.max(0.0).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}
