//! Scoped sudo context
//!
//! Sudo is never requested for the entire process. Instead:
//! 1. All changes are computed first (no sudo needed)
//! 2. Sudo is validated once before the first mutating call
//! 3. The cached credential is invalidated when the context drops

use anyhow::{Context, Result, bail};
use std::process::Command;

/// Whether the process runs with effective uid 0
pub fn is_root() -> bool {
    // SAFETY: geteuid takes no arguments, cannot fail and touches no memory.
    unsafe { libc::geteuid() == 0 }
}

/// Scoped sudo context - automatically invalidates on drop
pub struct SudoContext {
    _private: (),
}

impl SudoContext {
    /// Acquire sudo privileges with a reason shown to user
    pub fn acquire(reason: &str) -> Result<Self> {
        eprintln!();
        eprintln!("  Sudo required: {reason}");
        eprintln!();

        // Validate sudo (will prompt for password)
        let status = Command::new("sudo")
            .args(["-v"])
            .status()
            .context("Failed to execute sudo")?;

        if !status.success() {
            bail!("Failed to acquire sudo privileges");
        }

        log::debug!("sudo credentials validated");
        Ok(Self { _private: () })
    }
}

impl Drop for SudoContext {
    fn drop(&mut self) {
        // Invalidate sudo timestamp to release privileges
        let _ = Command::new("sudo").args(["-k"]).status();
        log::debug!("sudo credentials invalidated");
    }
}
