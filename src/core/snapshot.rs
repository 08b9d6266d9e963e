//! Plan snapshots — persist resolved decisions, compare later runs.
//!
//! A snapshot records every decision of a resolve run plus a digest over
//! them. `compare` reports each decision that would change if the same
//! manifest were resolved again, which makes re-evaluation drift visible.

use super::digest;
use super::types::{PlanSnapshot, ZonePlan};
use crate::runlog;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Derive the snapshot path for a zone within the state directory.
pub fn snapshot_path(state_dir: &Path, zone: &str) -> PathBuf {
    state_dir.join(zone).join("plan.lock.yaml")
}

/// Load a snapshot for a zone. Returns None if the file doesn't exist.
pub fn load_snapshot(state_dir: &Path, zone: &str) -> Result<Option<PlanSnapshot>, String> {
    let path = snapshot_path(state_dir, zone);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let snapshot: PlanSnapshot = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("invalid snapshot {}: {}", path.display(), e))?;
    Ok(Some(snapshot))
}

/// Save a snapshot atomically (write to temp, then rename).
pub fn save_snapshot(state_dir: &Path, snapshot: &PlanSnapshot) -> Result<(), String> {
    let path = snapshot_path(state_dir, &snapshot.zone);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
    }

    let yaml =
        serde_yaml_ng::to_string(snapshot).map_err(|e| format!("serialize error: {}", e))?;

    let tmp_path = path.with_extension("yaml.tmp");
    std::fs::write(&tmp_path, &yaml)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, &path).map_err(|e| {
        format!(
            "cannot rename {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;

    Ok(())
}

/// Build a snapshot from a resolved plan.
pub fn from_plan(plan: &ZonePlan) -> PlanSnapshot {
    let mut resources = IndexMap::new();
    for step in &plan.steps {
        resources.insert(step.key.clone(), step.clone());
    }
    PlanSnapshot {
        schema: "1.0".to_string(),
        zone: plan.zone.clone(),
        token: plan.token.clone(),
        generated_at: runlog::now_iso8601(),
        generator: format!("cimiento {}", env!("CARGO_PKG_VERSION")),
        digest: plan_digest(plan),
        resources,
        outputs: plan.outputs.clone(),
    }
}

/// Digest over the resolved decisions, in execution order.
pub fn plan_digest(plan: &ZonePlan) -> String {
    let mut components: Vec<String> = Vec::with_capacity(plan.steps.len() + 2);
    components.push(plan.zone.clone());
    components.push(plan.token.clone());
    for step in &plan.steps {
        components.push(format!(
            "{}\x1f{}\x1f{}\x1f{}",
            step.key, step.action, step.name, step.id
        ));
    }
    let refs: Vec<&str> = components.iter().map(String::as_str).collect();
    digest::composite(&refs)
}

/// One decision that differs between a stored snapshot and a fresh plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionChange {
    pub resource: String,
    pub field: String,
    pub expected: String,
    pub actual: String,
}

/// Compare a stored snapshot against a freshly resolved plan.
pub fn compare(snapshot: &PlanSnapshot, plan: &ZonePlan) -> Vec<DecisionChange> {
    let mut changes = Vec::new();

    if snapshot.token != plan.token {
        changes.push(DecisionChange {
            resource: "(scope)".to_string(),
            field: "token".to_string(),
            expected: snapshot.token.clone(),
            actual: plan.token.clone(),
        });
    }

    for (key, old) in &snapshot.resources {
        match plan.steps.iter().find(|s| &s.key == key) {
            None => changes.push(DecisionChange {
                resource: key.clone(),
                field: "presence".to_string(),
                expected: old.action.to_string(),
                actual: "absent".to_string(),
            }),
            Some(new) => {
                if old.action != new.action {
                    changes.push(DecisionChange {
                        resource: key.clone(),
                        field: "action".to_string(),
                        expected: old.action.to_string(),
                        actual: new.action.to_string(),
                    });
                }
                if old.name != new.name {
                    changes.push(DecisionChange {
                        resource: key.clone(),
                        field: "name".to_string(),
                        expected: old.name.clone(),
                        actual: new.name.clone(),
                    });
                }
                if old.id != new.id {
                    changes.push(DecisionChange {
                        resource: key.clone(),
                        field: "id".to_string(),
                        expected: old.id.clone(),
                        actual: new.id.clone(),
                    });
                }
            }
        }
    }

    for step in &plan.steps {
        if !snapshot.resources.contains_key(&step.key) {
            changes.push(DecisionChange {
                resource: step.key.clone(),
                field: "presence".to_string(),
                expected: "absent".to_string(),
                actual: step.action.to_string(),
            });
        }
    }

    changes
}
