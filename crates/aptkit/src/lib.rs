//! # aptkit
//!
//! apt/dpkg backend for [`reconcile`].
//!
//! This crate provides:
//! - [`AptBackend`], the `apt://` implementation of [`reconcile::Backend`]
//! - Classification of apt-get failures from its stderr
//! - Retry with exponential backoff for lock contention and network errors
//! - A [`CommandRunner`] seam so the backend can run without a real dpkg
//!
//! ## Example
//!
//! ```no_run
//! use aptkit::{AptBackend, AptConfig};
//! use reconcile::Backend;
//!
//! let apt = AptBackend::new(AptConfig::default()).expect("apt not available");
//! if !apt.is_installed("htop").unwrap_or(false) {
//!     apt.install("htop").expect("apt-get could not be run");
//! }
//! ```
//!
//! ## Failure model
//!
//! apt-get running and failing (unknown package, broken dependencies, a
//! lock that never frees up) makes the operation return `Ok(false)`. Only
//! being unable to run apt-get at all is an `Err`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apt;
pub mod error;
pub mod retry;
pub mod runner;
pub mod types;

pub use apt::{AptBackend, SCHEME, find_apt};
pub use error::{Error, ErrorCategory, Result};
pub use retry::{LogCallback, RetryCallback, with_retry};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use types::{AptConfig, RetryConfig};
