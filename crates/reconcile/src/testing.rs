//! In-memory backend for tests

use crate::backend::Backend;
use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct FakeState {
    /// installed package -> installed manually
    installed: BTreeMap<String, bool>,
    calls: Vec<String>,
}

/// Backend that keeps installed packages in memory.
///
/// Packages listed in `failing` never change state, so operations on them
/// report `false`. Packages listed in `broken` make every operation error.
#[derive(Debug)]
pub(crate) struct FakeBackend {
    scheme: String,
    state: Mutex<FakeState>,
    failing: BTreeSet<String>,
    broken: BTreeSet<String>,
}

impl FakeBackend {
    pub(crate) fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            state: Mutex::new(FakeState::default()),
            failing: BTreeSet::new(),
            broken: BTreeSet::new(),
        }
    }

    pub(crate) fn with_manual<'a>(self, names: impl IntoIterator<Item = &'a str>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for name in names {
                state.installed.insert(name.to_string(), true);
            }
        }
        self
    }

    pub(crate) fn with_dependency(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .installed
            .insert(name.to_string(), false);
        self
    }

    pub(crate) fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub(crate) fn broken_on(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn installed(&self, name: &str) -> bool {
        self.state.lock().unwrap().installed.contains_key(name)
    }

    fn record(&self, op: &str, name: &str) -> Result<()> {
        self.state.lock().unwrap().calls.push(format!("{op} {name}"));
        if self.broken.contains(name) {
            bail!("{op} {name}: package manager exploded");
        }
        Ok(())
    }

    fn uninstall(&self, op: &str, name: &str) -> Result<bool> {
        self.record(op, name)?;
        let mut state = self.state.lock().unwrap();
        if !state.installed.contains_key(name) {
            return Ok(false);
        }
        if !self.failing.contains(name) {
            state.installed.remove(name);
        }
        Ok(!state.installed.contains_key(name))
    }
}

impl Backend for FakeBackend {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn manual_installed(&self) -> Result<BTreeSet<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .installed
            .iter()
            .filter(|(_, manual)| **manual)
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.installed(name))
    }

    fn install(&self, name: &str) -> Result<bool> {
        self.record("install", name)?;
        let mut state = self.state.lock().unwrap();
        if state.installed.contains_key(name) {
            return Ok(false);
        }
        if !self.failing.contains(name) {
            state.installed.insert(name.to_string(), true);
        }
        Ok(state.installed.contains_key(name))
    }

    fn remove(&self, name: &str) -> Result<bool> {
        self.uninstall("remove", name)
    }

    fn purge(&self, name: &str) -> Result<bool> {
        self.uninstall("purge", name)
    }

    fn refresh_cache(&self) -> Result<bool> {
        self.record("refresh", "")?;
        Ok(true)
    }

    fn upgrade_all(&self) -> Result<bool> {
        self.record("upgrade", "")?;
        Ok(true)
    }

    fn autoremove(&self) -> Result<bool> {
        self.record("autoremove", "")?;
        let mut state = self.state.lock().unwrap();
        state.installed.retain(|_, manual| *manual);
        Ok(true)
    }
}
