//! Root privilege check
//!
//! Mutating commands check the effective uid before touching anything.

use anyhow::{Result, bail};

/// Whether the process runs with an effective uid of 0
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Fail unless running as root.
pub fn require_root() -> Result<()> {
    ensure_root(is_root())
}

fn ensure_root(root: bool) -> Result<()> {
    if !root {
        bail!("You need to run unip as root.");
    }
    Ok(())
}
