//! Record of the last apply run (`last-run.json` in the state directory)

use anyhow::{Context, Result};
use aptkit::ErrorCategory;
use chrono::{DateTime, Utc};
use declarative::{ApplyError, ExecuteSummary, ResourceOutcome};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const RUN_FILE: &str = "last-run.json";

// ============================================================================
// State Structures
// ============================================================================

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
    Cancelled,
}

/// The resource that stopped a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub index: usize,
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
}

/// One apply run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub descriptor: PathBuf,
    /// blake3 of the descriptor contents
    pub fingerprint: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default)]
    pub dry_run: bool,
    pub status: RunStatus,
    #[serde(default)]
    pub outcomes: Vec<ResourceOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
}

/// Fingerprint descriptor contents
pub fn fingerprint(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

// ============================================================================
// RunRecord Implementation
// ============================================================================

impl RunRecord {
    /// Build a record from the engine's result
    pub fn from_result(
        descriptor: &Path,
        fingerprint: String,
        started_at: DateTime<Utc>,
        dry_run: bool,
        result: &Result<ExecuteSummary, ApplyError>,
    ) -> Self {
        let (status, outcomes, failure) = match result {
            Ok(summary) => (RunStatus::Succeeded, summary.outcomes.clone(), None),
            Err(e) => {
                let status = if e.is_cancelled() {
                    RunStatus::Cancelled
                } else {
                    RunStatus::Failed
                };
                let failure = RunFailure {
                    index: e.index,
                    id: e.id.clone(),
                    message: e.kind.to_string(),
                    category: e.adapter_error().map(aptkit::Error::category),
                };
                (status, e.summary.outcomes.clone(), Some(failure))
            }
        };

        Self {
            descriptor: descriptor.to_path_buf(),
            fingerprint,
            started_at,
            finished_at: Utc::now(),
            dry_run,
            status,
            outcomes,
            failure,
        }
    }

    /// Load the last run from the state directory, if any
    pub fn load() -> Result<Option<Self>> {
        Self::load_from(&crate::paths::state_dir()?)
    }

    /// Load the last run from a specific state directory
    pub fn load_from(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(RUN_FILE);
        if !path.exists() {
            log::debug!("No run record at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read run record: {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse run record: {}", path.display()))?;
        Ok(Some(record))
    }

    /// Save to the state directory
    pub fn save(&self) -> Result<PathBuf> {
        self.save_to(&crate::paths::state_dir()?)
    }

    /// Save to a specific state directory
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;

        let path = dir.join(RUN_FILE);
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize run record")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write run record: {}", path.display()))?;

        log::debug!("Saved run record to {}", path.display());
        Ok(path)
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

// ============================================================================
// Tests
// ============================================================================
