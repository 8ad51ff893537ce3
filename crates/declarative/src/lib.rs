//! # Declarative
//!
//! Declarative package provisioning: describe the repositories and packages
//! a Debian-family system should have, then converge it idempotently.
//!
//! ## Core Concepts
//!
//! - **Resource**: a repository or package that should be present
//! - **Descriptor**: a validated, ordered collection of resources
//! - **ExecutionPlan**: the descriptor's resources in apply order
//! - **Executor**: applies the plan one resource at a time through an
//!   [`aptkit::Adapter`], skipping whatever is already satisfied
//!
//! ## Example
//!
//! ```no_run
//! use aptkit::adapter::apt::AptAdapter;
//! use aptkit::AptOptions;
//! use declarative::{Descriptor, ExecuteOptions, ExecutionPlan, execute_simple};
//! use std::path::Path;
//!
//! let descriptor = Descriptor::load(Path::new("demos/ocaml-precise.toml"))?;
//! let plan = ExecutionPlan::from_descriptor(&descriptor);
//! let apt = AptAdapter::new(AptOptions::default())?;
//!
//! let summary = execute_simple(&plan, &apt, &ExecuteOptions::default())?;
//! println!("{} changed", summary.total_changes());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Hooks
//!
//! - [`ProgressCallback`]: receives per-resource progress
//! - [`CancelToken`]: stops a run between resources
//!
//! Neither depends on a UI framework or signal library.

pub mod context;
pub mod descriptor;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::{CancelToken, NoProgress, ProgressCallback};
pub use descriptor::{Descriptor, DescriptorFormat};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs, group_by_type};
pub use error::{ApplyError, ApplyErrorKind, DescriptorError, InvalidResource, ValidationError};
pub use executor::{execute, execute_simple};
pub use planner::{ExecutionPlan, PlannedStep};
pub use types::{
    ApplyResult, ExecuteOptions, ExecuteSummary, PackageResource, RepositoryResource, Resource,
    ResourceOutcome, ResourceState,
};
