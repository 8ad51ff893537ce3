//! Error types for descriptors and the apply engine

use crate::types::ExecuteSummary;
use std::path::PathBuf;
use thiserror::Error;

/// A single resource failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Package name is empty
    #[error("package name is empty")]
    EmptyName,

    /// Package name does not follow the Debian package-name grammar
    #[error("invalid package name '{0}'")]
    InvalidName(String),

    /// Repository id is empty
    #[error("repository id is empty")]
    EmptyId,

    /// Repository id is not usable as an APT sources file name
    #[error("invalid repository id '{0}' (allowed: letters, digits, '_', '-', '.')")]
    InvalidId(String),

    /// Repository uri is empty
    #[error("repository uri is empty")]
    EmptyUri,

    /// Repository uri is not a `scheme://host...` URL APT understands
    #[error("invalid repository uri '{0}'")]
    InvalidUri(String),

    /// Repository distribution is empty
    #[error("repository distribution is empty")]
    EmptyDistribution,

    /// Repository lists no components
    #[error("repository has no components")]
    NoComponents,

    /// Two resources share an id
    #[error("duplicate id '{id}' (first declared at resource[{first}])")]
    DuplicateId {
        /// The shared id
        id: String,
        /// Index of the first declaration
        first: usize,
    },

    /// Version string fails the Debian version grammar
    #[error("malformed version '{0}'")]
    MalformedVersion(String),

    /// `depends_on` names no resource in the descriptor
    #[error("depends on unknown resource '{0}'")]
    UnknownDependency(String),

    /// Resources depend on each other in a cycle
    #[error("dependency cycle between {}", .0.join(", "))]
    DependencyCycle(Vec<String>),
}

/// Validation failure located in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resource[{index}] {id}: {error}")]
pub struct InvalidResource {
    /// Declaration index (0-based)
    pub index: usize,
    /// Display id of the resource, e.g. `package:ocaml`
    pub id: String,
    /// What is wrong with it
    pub error: ValidationError,
}

/// Errors loading a descriptor file.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// File could not be read
    #[error("could not read descriptor {}: {source}", .path.display())]
    Io {
        /// Descriptor path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML, or TOML that does not match the descriptor schema
    #[error("invalid TOML descriptor: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid JSON, or JSON that does not match the descriptor schema
    #[error("invalid JSON descriptor: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension is neither `.toml` nor `.json`
    #[error("unsupported descriptor format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Parsed fine but failed validation
    #[error("invalid descriptor: {0}")]
    Invalid(#[from] InvalidResource),

    /// A target filter selected none of the descriptor's resources
    #[error("target '{0}' matches no resource in the descriptor")]
    UnmatchedTarget(String),
}

/// Why applying a resource stopped the run.
#[derive(Debug, Error)]
pub enum ApplyErrorKind {
    /// Non-transient adapter failure, not retried
    #[error("{0}")]
    Fatal(aptkit::Error),

    /// Transient adapter failure that persisted through every attempt
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last: aptkit::Error,
    },

    /// The run was cancelled before this resource
    #[error("cancelled before this resource was applied")]
    Cancelled,
}

/// First fatal failure of a run.
///
/// Resources applied before the failure are left as they are; `summary`
/// records them.
#[derive(Debug, Error)]
#[error("resource[{index}] {id}: {kind}")]
pub struct ApplyError {
    /// Declaration index (0-based) of the failing resource
    pub index: usize,
    /// Display id of the failing resource
    pub id: String,
    /// Cause
    pub kind: ApplyErrorKind,
    /// Outcomes of the resources processed before the failure
    pub summary: ExecuteSummary,
}

impl ApplyError {
    /// Classify an adapter error returned by the retry wrapper.
    pub(crate) fn from_adapter(
        index: usize,
        id: String,
        error: aptkit::Error,
        attempts: u32,
        summary: ExecuteSummary,
    ) -> Self {
        let kind = if error.is_retryable() {
            ApplyErrorKind::Exhausted {
                attempts,
                last: error,
            }
        } else {
            ApplyErrorKind::Fatal(error)
        };
        Self {
            index,
            id,
            kind,
            summary,
        }
    }

    /// Whether the run was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ApplyErrorKind::Cancelled)
    }

    /// Underlying adapter error, if any.
    pub fn adapter_error(&self) -> Option<&aptkit::Error> {
        match &self.kind {
            ApplyErrorKind::Fatal(e) | ApplyErrorKind::Exhausted { last: e, .. } => Some(e),
            ApplyErrorKind::Cancelled => None,
        }
    }
}
