//! Core types for declarative package provisioning

use aptkit::RetryConfig;
use serde::{Deserialize, Serialize};

/// A package that should be installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageResource {
    /// Package name as known to the package manager
    pub name: String,
    /// Exact version to install; any installed version satisfies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Extra arguments passed to the installer, in order
    #[serde(default, alias = "options", skip_serializing_if = "Vec::is_empty")]
    pub install_options: Vec<String>,
    /// Ids of resources that must be applied first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// A package repository that should be registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryResource {
    /// Unique id, also the sources list file name
    pub id: String,
    /// Archive root URI
    pub uri: String,
    /// Distribution (suite) name
    pub distribution: String,
    /// Archive components; duplicates are dropped, order is kept
    pub components: Vec<String>,
    /// Also register source packages
    #[serde(default, alias = "deb_src")]
    pub include_source: bool,
    /// Ids of resources that must be applied first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// A declared unit of desired state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Resource {
    /// Package repository
    Repository(RepositoryResource),
    /// Installed package
    Package(PackageResource),
}

/// Current or desired state of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    /// Resource exists; `details` carries a version when relevant
    Present { details: Option<String> },
    /// Resource does not exist
    Absent,
}

impl ResourceState {
    /// Check if state represents presence
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Check if state represents absence
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Whether this (current) state satisfies a desired state.
    ///
    /// A desired `Present` without details accepts any present state;
    /// with details it requires the same details (pinned version).
    pub fn satisfies(&self, desired: &ResourceState) -> bool {
        match (self, desired) {
            (Self::Present { details: current }, Self::Present { details: wanted }) => {
                wanted.is_none() || wanted == current
            }
            (Self::Absent, Self::Absent) => true,
            _ => false,
        }
    }
}

/// Result of applying a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ApplyResult {
    /// Already satisfied, nothing done
    NoChange,
    /// Resource was added or installed
    Created,
    /// Resource existed in another version and was changed
    Modified,
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

/// Outcome of one resource in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOutcome {
    /// Declaration index (0-based)
    pub index: usize,
    /// Display id, e.g. `package:m4`
    pub id: String,
    /// What happened
    pub result: ApplyResult,
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub skipped: usize,
    pub no_change: usize,
    /// Per-resource outcomes in apply order
    pub outcomes: Vec<ResourceOutcome>,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Record an outcome
    pub fn record(&mut self, outcome: ResourceOutcome) {
        match &outcome.result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Query only; report what would change
    pub dry_run: bool,
    /// Retry policy for transient adapter failures
    pub retry: RetryConfig,
}
