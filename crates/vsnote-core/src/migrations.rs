//! Version upgrade steps.
//!
//! Every step is registered in [`REGISTRY`] under the version that introduced
//! it. On startup [`run_upgrade`] runs, in ascending version order, each step
//! whose version lies in `(previous, current]`.

use crate::actions::{ActionLog, Actions};
use crate::error::{Result, TelemetryError};
use crate::version;
use crate::{io, paths};
use semver::Version;
use serde::Serialize;
use std::path::Path;

/// Everything a step is allowed to touch.
#[derive(Debug, Clone, Copy)]
pub struct MigrationContext<'a> {
    pub state_dir: &'a Path,
}

#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    pub version: &'static str,
    pub description: &'static str,
    pub run: fn(&MigrationContext) -> Result<()>,
}

/// Built-in steps. Add new entries here when a release changes on-disk state.
pub static REGISTRY: &[MigrationStep] = &[
    MigrationStep {
        version: "0.2.0",
        description: "rename legacy clientId file to id",
        run: rename_legacy_client_id,
    },
    MigrationStep {
        version: "0.3.0",
        description: "normalize pending actions file",
        run: normalize_actions,
    },
];

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub version: String,
    pub description: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeReport {
    pub previous: String,
    pub current: String,
    pub steps: Vec<StepOutcome>,
}

impl UpgradeReport {
    pub fn upgraded(&self) -> bool {
        self.previous != self.current
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| !s.ok)
    }
}

// ---------------------------------------------------------------------------
// Planning and execution
// ---------------------------------------------------------------------------

/// Steps with `previous < version <= current`, ascending by version.
///
/// Steps whose version does not parse are skipped with a warning.
pub fn plan<'s>(
    steps: &'s [MigrationStep],
    previous: &Version,
    current: &Version,
) -> Vec<&'s MigrationStep> {
    let mut selected: Vec<(Version, &MigrationStep)> = steps
        .iter()
        .filter_map(|step| match version::parse(step.version) {
            Ok(v) => Some((v, step)),
            Err(e) => {
                tracing::warn!(step = step.version, error = %e, "skipping migration with invalid version");
                None
            }
        })
        .filter(|(v, _)| {
            version::compare(v, previous).is_gt() && version::compare(v, current).is_le()
        })
        .collect();
    selected.sort_by(|(a, _), (b, _)| version::compare(a, b));
    selected.into_iter().map(|(_, step)| step).collect()
}

/// Run every applicable step once, in order. A failing step is recorded and
/// logged; later steps still run.
pub fn execute(ctx: &MigrationContext, steps: &[&MigrationStep]) -> Vec<StepOutcome> {
    steps
        .iter()
        .map(|step| {
            let result = (step.run)(ctx);
            match &result {
                Ok(()) => tracing::info!(step = step.version, "applied upgrade step"),
                Err(e) => {
                    tracing::error!(step = step.version, error = %e, "upgrade step failed")
                }
            }
            StepOutcome {
                version: step.version.to_string(),
                description: step.description.to_string(),
                ok: result.is_ok(),
                error: result.err().map(|e| {
                    TelemetryError::MigrationFailed {
                        version: step.version.to_string(),
                        reason: e.to_string(),
                    }
                    .to_string()
                }),
            }
        })
        .collect()
}

/// The steps an upgrade from the detected previous installation to `current` would run.
#[derive(Debug, Clone)]
pub struct UpgradePlan<'s> {
    pub previous: Version,
    pub current: Version,
    pub steps: Vec<&'s MigrationStep>,
}

impl UpgradePlan<'_> {
    pub fn is_upgrade(&self) -> bool {
        !version::compare(&self.previous, &self.current).is_eq()
    }
}

/// Detect the previous installation and select the steps for `(previous, current]`.
pub fn plan_upgrade<'s>(
    steps: &'s [MigrationStep],
    installs_dir: &Path,
    identifier: &str,
    current: &str,
) -> Result<UpgradePlan<'s>> {
    let current = version::parse(current)?;
    let previous = version::previous_version(installs_dir, identifier, &current)?;
    let steps = if version::compare(&current, &previous).is_eq() {
        Vec::new()
    } else {
        plan(steps, &previous, &current)
    };
    Ok(UpgradePlan {
        previous,
        current,
        steps,
    })
}

/// Detect the previous installation and run the steps for `(previous, current]`.
pub fn run_upgrade(
    ctx: &MigrationContext,
    steps: &[MigrationStep],
    installs_dir: &Path,
    identifier: &str,
    current: &str,
) -> Result<UpgradeReport> {
    let plan = plan_upgrade(steps, installs_dir, identifier, current)?;
    let current = plan.current.to_string();
    if !plan.is_upgrade() {
        tracing::debug!(version = %current, "no upgrade detected");
        return Ok(UpgradeReport {
            previous: current.clone(),
            current,
            steps: Vec::new(),
        });
    }

    let outcomes = execute(ctx, &plan.steps);
    tracing::info!(
        from = %plan.previous,
        to = %plan.current,
        steps = outcomes.len(),
        "upgrade complete"
    );
    Ok(UpgradeReport {
        previous: plan.previous.to_string(),
        current,
        steps: outcomes,
    })
}

// ---------------------------------------------------------------------------
// Built-in steps
// ---------------------------------------------------------------------------

fn rename_legacy_client_id(ctx: &MigrationContext) -> Result<()> {
    let legacy = paths::legacy_id_path(ctx.state_dir);
    let Some(id) = io::read_optional(&legacy)? else {
        return Ok(());
    };
    io::write_if_missing(&paths::id_path(ctx.state_dir), id.trim().as_bytes())?;
    io::remove_if_exists(&legacy)?;
    Ok(())
}

fn normalize_actions(ctx: &MigrationContext) -> Result<()> {
    let log = ActionLog::new(ctx.state_dir);
    let Some(raw) = io::read_optional(log.path())? else {
        return Ok(());
    };
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(&raw)
    else {
        tracing::warn!("removing unparseable actions file");
        return log.clear();
    };

    let mut actions = Actions::new();
    for (name, value) in map {
        let timestamps: Vec<i64> = value
            .as_array()
            .map(|items| items.iter().filter_map(serde_json::Value::as_i64).collect())
            .unwrap_or_default();
        if !timestamps.is_empty() {
            actions.insert(name, timestamps);
        }
    }

    if actions.is_empty() {
        log.clear()
    } else {
        log.stage(&actions)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
