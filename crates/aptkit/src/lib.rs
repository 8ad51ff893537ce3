//! # aptkit
//!
//! Pure Rust library for APT package management on Debian-based systems.
//!
//! This crate provides functionality for:
//! - Querying installed packages through `dpkg-query`
//! - Installing packages (optionally pinned) through `apt-get`
//! - Registering repositories as `sources.list.d` entries
//! - Classifying failures as transient or fatal, and retrying the
//!   transient ones with exponential backoff
//!
//! ## Example
//!
//! ```no_run
//! use aptkit::adapter::{Adapter, apt::AptAdapter};
//! use aptkit::{AptOptions, PackageState};
//!
//! let apt = AptAdapter::new(AptOptions::default()).expect("apt not available");
//!
//! if apt.query_package("m4").unwrap() == PackageState::Absent {
//!     apt.install_package("m4", None, &[]).expect("install failed");
//! }
//! ```
//!
//! ## Retry Logic
//!
//! Network errors and dpkg lock contention are retried with exponential
//! backoff. Configure retry behavior with [`RetryConfig`].
//!
//! ```no_run
//! use aptkit::adapter::{Adapter, apt::AptAdapter};
//! use aptkit::{AptOptions, RetryConfig, retry};
//! use std::time::Duration;
//!
//! let apt = AptAdapter::new(AptOptions::default()).unwrap();
//! let config = RetryConfig::new(3, Duration::from_secs(5), 2.0);
//!
//! retry::with_retry(&config, None, || apt.install_package("curl", None, &[])).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod error;
pub mod retry;
pub mod sources;
pub mod types;

pub use adapter::Adapter;
pub use error::{Error, ErrorCategory, Result};
pub use types::{AptOptions, PackageState, RetryConfig, SourceEntry};
