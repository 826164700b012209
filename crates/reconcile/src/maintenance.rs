//! Bulk maintenance across backends (cache refresh, upgrade, autoremove)

use crate::backend::{Backend, BackendRegistry};
use crate::types::Outcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bulk operation that is not tied to one package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maintenance {
    RefreshCache,
    UpgradeAll,
    Autoremove,
}

impl Maintenance {
    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::RefreshCache => "update package cache",
            Self::UpgradeAll => "upgrade packages",
            Self::Autoremove => "autoremove packages",
        }
    }

    fn run(self, backend: &dyn Backend) -> anyhow::Result<bool> {
        match self {
            Self::RefreshCache => backend.refresh_cache(),
            Self::UpgradeAll => backend.upgrade_all(),
            Self::Autoremove => backend.autoremove(),
        }
    }
}

impl fmt::Display for Maintenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of a maintenance task on one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceResult {
    pub scheme: String,
    pub task: Maintenance,
    pub outcome: Outcome,
}

/// Run `task` on a single backend.
pub fn run_on(backend: &dyn Backend, task: Maintenance) -> MaintenanceResult {
    let outcome = match task.run(backend) {
        Ok(true) => Outcome::Applied,
        Ok(false) => Outcome::Failed {
            error: format!("{} could not {task}", backend.scheme()),
        },
        Err(e) => Outcome::Failed {
            error: format!("{e:#}"),
        },
    };

    if let Outcome::Failed { error } = &outcome {
        log::warn!("{task} failed for {}: {error}", backend.scheme());
    }

    MaintenanceResult {
        scheme: backend.scheme().to_string(),
        task,
        outcome,
    }
}

/// Run `task` on every registered backend, in scheme order.
///
/// Unavailable backends are skipped. A failing backend does not stop the
/// others.
pub fn run_all(registry: &BackendRegistry, task: Maintenance) -> Vec<MaintenanceResult> {
    registry
        .backends()
        .map(|backend| {
            if backend.is_available() {
                run_on(backend.as_ref(), task)
            } else {
                MaintenanceResult {
                    scheme: backend.scheme().to_string(),
                    task,
                    outcome: Outcome::Skipped {
                        reason: "backend not available".to_string(),
                    },
                }
            }
        })
        .collect()
}
