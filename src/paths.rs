//! Centralized path resolution for provision
//!
//! # Environment Variables
//!
//! - `PROVISION_CONFIG_DIR` - Override config directory
//! - `PROVISION_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `PROVISION_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/provision` (if set)
//! 3. `~/.config/provision`
//!
//! For state_dir():
//! 1. `PROVISION_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/provision` (if set)
//! 3. `~/.local/state/provision`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "PROVISION_CONFIG_DIR";

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "PROVISION_STATE_DIR";

const APP_DIR: &str = "provision";

/// Get the provision config directory path
pub fn config_dir() -> Result<PathBuf> {
    resolve(ENV_CONFIG_DIR, "XDG_CONFIG_HOME", &[".config"])
}

/// Get the provision state directory path
pub fn state_dir() -> Result<PathBuf> {
    resolve(ENV_STATE_DIR, "XDG_STATE_HOME", &[".local", "state"])
}

fn resolve(override_var: &str, xdg_var: &str, home_default: &[&str]) -> Result<PathBuf> {
    // 1. Check environment variable override
    if let Ok(dir) = std::env::var(override_var) {
        let path = expand(&dir);
        log::debug!("Using dir from {}: {}", override_var, path.display());
        return Ok(path);
    }

    // 2. Check XDG variable
    if let Ok(xdg) = std::env::var(xdg_var)
        && !xdg.is_empty()
    {
        let path = PathBuf::from(xdg).join(APP_DIR);
        log::debug!("Using {}: {}", xdg_var, path.display());
        return Ok(path);
    }

    // 3. Home default
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home_default
        .iter()
        .fold(home, |acc, part| acc.join(part))
        .join(APP_DIR);
    log::debug!("Using default dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
///
/// Falls back to the literal string when a variable is undefined.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
