//! Path resolution for unip
//!
//! # Environment Variables
//!
//! - `UNIP_CONFIG_DIR` - Override config directory
//! - `UNIP_LIST_FILE` - Override the package list (handled by the CLI)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `UNIP_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/unip` (if set)
//! 3. `/etc/unip` when running as root
//! 4. `~/.config/unip`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "UNIP_CONFIG_DIR";

/// System-wide config directory used by root
pub const SYSTEM_CONFIG_DIR: &str = "/etc/unip";

/// Default location of the package list
pub const DEFAULT_LIST_FILE: &str = "/var/lib/unip/packages.list";

/// Name of the config file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the unip config directory path
pub fn config_dir() -> Result<PathBuf> {
    config_dir_for(crate::privilege::is_root())
}

fn config_dir_for(root: bool) -> Result<PathBuf> {
    // 1. Check environment variable override
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("Using config dir from {}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    // 2. Check XDG_CONFIG_HOME
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("unip");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    // 3. System config for root
    if root {
        log::debug!("Using system config dir: {SYSTEM_CONFIG_DIR}");
        return Ok(PathBuf::from(SYSTEM_CONFIG_DIR));
    }

    // 4. Default: ~/.config/unip
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("unip");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Path of the config file
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Expand a path that may already be a `Path`.
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => expand(s),
        None => path.to_path_buf(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    /// Serializes tests that touch process environment variables
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Helper to run a test with temporary env var
    ///
    /// # Safety
    /// This function uses unsafe env::set_var/remove_var. Callers hold
    /// `ENV_LOCK` so no other test reads the environment concurrently.
    pub(crate) fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: env access is serialized by ENV_LOCK
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: env access is serialized by ENV_LOCK
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    /// Helper to run a test with env var removed
    pub(crate) fn without_env_var<F, R>(key: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: env access is serialized by ENV_LOCK
        unsafe { env::remove_var(key) };
        let result = f();
        if let Some(v) = original {
            // SAFETY: env access is serialized by ENV_LOCK
            unsafe { env::set_var(key, v) };
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        with_env_var(ENV_CONFIG_DIR, "/custom/config/path", || {
            let result = config_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/config/path"));
        });
    }

    #[test]
    fn test_config_dir_env_override_with_tilde() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let home = dirs::home_dir().unwrap();
        with_env_var(ENV_CONFIG_DIR, "~/dotfiles/unip", || {
            assert_eq!(config_dir().unwrap(), home.join("dotfiles").join("unip"));
        });
    }

    #[test]
    fn test_xdg_config_home() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        without_env_var(ENV_CONFIG_DIR, || {
            with_env_var("XDG_CONFIG_HOME", "/tmp/xdg-config-test", || {
                assert_eq!(
                    config_dir_for(true).unwrap(),
                    PathBuf::from("/tmp/xdg-config-test/unip")
                );
            });
        });
    }

    #[test]
    fn test_root_uses_system_dir() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        without_env_var(ENV_CONFIG_DIR, || {
            without_env_var("XDG_CONFIG_HOME", || {
                assert_eq!(config_dir_for(true).unwrap(), PathBuf::from(SYSTEM_CONFIG_DIR));

                let home = dirs::home_dir().unwrap();
                assert_eq!(config_dir_for(false).unwrap(), home.join(".config").join("unip"));
            });
        });
    }

    #[test]
    fn test_config_file_name() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        with_env_var(ENV_CONFIG_DIR, "/custom", || {
            assert_eq!(config_file().unwrap(), PathBuf::from("/custom/config.toml"));
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        assert_eq!(expand("/absolute/path"), PathBuf::from("/absolute/path"));
        assert_eq!(
            expand_path(Path::new(DEFAULT_LIST_FILE)),
            PathBuf::from(DEFAULT_LIST_FILE)
        );
    }
}
