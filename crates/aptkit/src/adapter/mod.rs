//! Adapter abstraction for the target system's package state.
//!
//! The [`Adapter`] trait is the only way the apply engine touches the
//! system, allowing for different implementations (real apt-get/dpkg,
//! recording fakes for testing).

pub mod apt;

use crate::error::Result;
use crate::types::{PackageState, SourceEntry};

/// Query and mutate installed packages and registered repositories.
///
/// Implementations block until the underlying package manager returns.
/// They do not lock anything themselves; concurrent access is arbitrated
/// by the package manager.
pub trait Adapter: Send + Sync {
    /// Report whether and at which version a package is installed.
    fn query_package(&self, name: &str) -> Result<PackageState>;

    /// Install a package, optionally pinned to a version.
    fn install_package(&self, name: &str, version: Option<&str>, options: &[String])
    -> Result<()>;

    /// Check if a repository with this id is registered.
    fn query_repository(&self, id: &str) -> Result<bool>;

    /// Register a repository and refresh the package index.
    fn add_repository(&self, source: &SourceEntry<'_>) -> Result<()>;
}
