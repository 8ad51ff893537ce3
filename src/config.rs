//! User configuration (`config.toml` in the config directory)
//!
//! ```toml
//! [retry]
//! max_attempts = 5
//! base_delay_secs = 2
//! backoff_factor = 2.0
//! max_delay_secs = 60
//!
//! [apt]
//! force_yes = false
//! sources_dir = "/etc/apt/sources.list.d"
//! use_sudo = true
//! ```

use anyhow::{Context, Result};
use aptkit::{AptOptions, RetryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub apt: AptSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
    pub backoff_factor: f64,
    pub max_delay_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_attempts: defaults.max_attempts,
            base_delay_secs: defaults.base_delay.as_secs(),
            backoff_factor: defaults.backoff_factor,
            max_delay_secs: defaults.max_delay.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AptSection {
    pub force_yes: bool,
    pub sources_dir: String,
    /// Prefix privileged commands with sudo when not root
    pub use_sudo: bool,
}

impl Default for AptSection {
    fn default() -> Self {
        Self {
            force_yes: false,
            sources_dir: AptOptions::default().sources_dir.display().to_string(),
            use_sudo: true,
        }
    }
}

impl AppConfig {
    /// Path of the user config file
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::paths::config_dir()?.join(CONFIG_FILE))
    }

    /// Load the user config; a missing file means defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load config from a specific file; a missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        if config.retry.max_attempts == 0 {
            anyhow::bail!(
                "Invalid config file: {}: retry.max_attempts must be at least 1",
                path.display()
            );
        }

        let factor = config.retry.backoff_factor;
        if !factor.is_finite() || factor < 1.0 {
            anyhow::bail!(
                "Invalid config file: {}: retry.backoff_factor must be a number >= 1.0, got {factor}",
                path.display()
            );
        }

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, retries: Option<u32>, force_yes: bool) -> Self {
        if let Some(n) = retries {
            self.retry.max_attempts = n.max(1);
        }
        if force_yes {
            self.apt.force_yes = true;
        }
        self
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_secs(self.retry.base_delay_secs),
            backoff_factor: self.retry.backoff_factor,
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
        }
    }

    /// Adapter options; sudo is only used when configured and not root.
    pub fn apt_options(&self, is_root: bool) -> AptOptions {
        AptOptions {
            force_yes: self.apt.force_yes,
            sources_dir: crate::paths::expand(&self.apt.sources_dir),
            use_sudo: self.apt.use_sudo && !is_root,
            ..AptOptions::default()
        }
    }
}
