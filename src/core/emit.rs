//! Plan and output rendering.
//!
//! The plan listing is for humans; the outputs document is the machine
//! interface consumed by downstream deployment stages.

use super::types::{ResolveAction, ZonePlan};
use std::path::Path;

/// Display a plan to stdout.
pub fn print_plan(plan: &ZonePlan, resource_filter: Option<&str>) {
    println!(
        "Zone: {} ({} resources, token {})",
        plan.zone,
        plan.steps.len(),
        plan.token
    );
    println!();

    for step in &plan.steps {
        if let Some(filter) = resource_filter {
            if step.key != filter {
                continue;
            }
        }
        let symbol = match step.action {
            ResolveAction::Create => "+",
            ResolveAction::Reuse => "=",
            ResolveAction::Skip => "-",
        };
        println!("  {} {}", symbol, step.description);
    }

    println!();
    println!(
        "Plan: {} to create, {} reused, {} skipped.",
        plan.to_create, plan.to_reuse, plan.skipped
    );
}

/// Render the outputs document as YAML.
pub fn render_outputs_yaml(plan: &ZonePlan) -> Result<String, String> {
    serde_yaml_ng::to_string(&plan.outputs).map_err(|e| format!("serialize error: {}", e))
}

/// Render the outputs document as pretty JSON.
pub fn render_outputs_json(plan: &ZonePlan) -> Result<String, String> {
    serde_json::to_string_pretty(&plan.outputs).map_err(|e| format!("serialize error: {}", e))
}

/// Write the outputs document to a file.
pub fn write_outputs(plan: &ZonePlan, path: &Path, json: bool) -> Result<(), String> {
    let rendered = if json {
        render_outputs_json(plan)?
    } else {
        render_outputs_yaml(plan)?
    };
    std::fs::write(path, rendered)
        .map_err(|e| format!("cannot write {}: {}", path.display(), e))
}
