//! Diff computation for resources

use crate::error::ApplyError;
use crate::executor::retrying;
use crate::planner::ExecutionPlan;
use crate::types::{ExecuteSummary, ResourceState};
use aptkit::{Adapter, RetryConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Declaration index (0-based)
    pub index: usize,
    /// Display id, e.g. `package:ocaml`
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Human-readable description
    pub description: String,
    /// Current state
    pub current: ResourceState,
    /// Desired state
    pub desired: ResourceState,
}

impl ResourceDiff {
    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        self.current.is_absent()
    }

    /// Check if this diff represents a version change of something present
    pub fn is_modification(&self) -> bool {
        self.current.is_present()
    }
}

/// Compute diffs for every step of a plan, in apply order.
///
/// Only queries the adapter. Returns the resources whose current state does
/// not satisfy the desired state.
pub fn compute_diffs<A: Adapter + ?Sized>(
    plan: &ExecutionPlan<'_>,
    adapter: &A,
    retry: &RetryConfig,
) -> Result<Vec<ResourceDiff>, ApplyError> {
    let mut diffs = Vec::new();
    let nothing_applied = ExecuteSummary::default();

    for step in plan.iter() {
        let resource = step.resource;
        let id = resource.display_id();
        let current = retrying(retry, step.index, &id, &nothing_applied, || {
            resource.current_state(adapter)
        })?;

        let desired = resource.desired_state();
        if current.satisfies(&desired) {
            continue;
        }

        diffs.push(ResourceDiff {
            index: step.index,
            resource_id: id,
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            current,
            desired,
        });
    }

    Ok(diffs)
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of resources to add or install
    pub additions: usize,
    /// Number of packages to move to another version
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            }
            if diff.is_modification() {
                summary.modifications += 1;
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type, keeping apply order inside each group
pub fn group_by_type(diffs: &[ResourceDiff]) -> BTreeMap<String, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<String, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.clone())
            .or_default()
            .push(diff);
    }
    groups
}
