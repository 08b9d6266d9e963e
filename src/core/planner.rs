//! Plan generation — resolve every resource into a decision and assemble
//! the zone plan.
//!
//! Walks the topological order, expands templates, applies the
//! create-or-reuse rule, composes identifiers and endpoints, and collects
//! the outputs handed to downstream stages.

use super::graph;
use super::naming;
use super::resolver::{self, ResourceRef};
use super::template;
use super::types::{
    OutputValue, ResolveAction, ResolvedResource, ResourceKind, ResourceSpec, ZoneConfig, ZonePlan,
};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Resolve a full manifest into a plan.
pub fn plan(config: &ZoneConfig) -> Result<ZonePlan, String> {
    let token = resolver::deployment_token(&config.scope);
    let execution_order = graph::build_execution_order(config)?;

    let mut steps: Vec<ResolvedResource> = Vec::with_capacity(execution_order.len());
    let mut outputs: IndexMap<String, OutputValue> = IndexMap::new();
    let mut skipped_keys: HashSet<String> = HashSet::new();
    let mut to_create = 0u32;
    let mut to_reuse = 0u32;
    let mut skipped = 0u32;

    for key in &execution_order {
        let spec = &config.resources[key];
        let resolved_spec = template::resolve_spec(spec, &config.params, &config.scope, &token)?;
        let existing = resolved_spec.existing_id.as_deref().unwrap_or("");

        if !resolved_spec.deploy && existing.is_empty() {
            skipped += 1;
            skipped_keys.insert(key.clone());
            steps.push(ResolvedResource {
                key: key.clone(),
                kind: spec.kind,
                action: ResolveAction::Skip,
                name: String::new(),
                id: String::new(),
                endpoint: None,
                subscription: String::new(),
                resource_group: String::new(),
                description: describe(key, &resolved_spec, ResolveAction::Skip, ""),
            });
            continue;
        }

        check_no_skipped_references(key, &resolved_spec, &skipped_keys)?;

        if config.policy.strict_ids && !existing.is_empty() && !resolver::is_well_formed(existing) {
            return Err(format!(
                "resource '{}' has malformed existing_id '{}'",
                key, existing
            ));
        }

        if let Some(ref name) = resolved_spec.name {
            naming::validate_name(spec.kind, name)
                .map_err(|e| format!("resource '{}': {}", key, e))?;
        }

        // Private DNS zones are named by their zone FQDN when no explicit
        // name is given.
        let desired = resolved_spec.name.as_deref().or(match spec.kind {
            ResourceKind::PrivateDnsZone => resolved_spec.zone_name.as_deref(),
            _ => None,
        });

        let step = match resolver::resolve(existing, desired, spec.kind, &token) {
            ResourceRef::Create { name } => {
                to_create += 1;
                let id = resolver::compose_id(&config.scope, spec.kind, &name);
                let endpoint = naming::endpoint(spec.kind, &name);
                let description = describe(key, &resolved_spec, ResolveAction::Create, &name);
                ResolvedResource {
                    key: key.clone(),
                    kind: spec.kind,
                    action: ResolveAction::Create,
                    name,
                    id,
                    endpoint,
                    subscription: config.scope.subscription.clone(),
                    resource_group: config.scope.resource_group.clone(),
                    description,
                }
            }
            ResourceRef::Reuse {
                subscription,
                resource_group,
                name,
                id,
            } => {
                to_reuse += 1;
                let endpoint = naming::endpoint(spec.kind, &name);
                let description = describe(key, &resolved_spec, ResolveAction::Reuse, &name);
                ResolvedResource {
                    key: key.clone(),
                    kind: spec.kind,
                    action: ResolveAction::Reuse,
                    name,
                    id,
                    endpoint,
                    subscription,
                    resource_group,
                    description,
                }
            }
        };

        outputs.insert(key.clone(), output_value(&step, &resolved_spec));
        steps.push(step);
    }

    check_no_identifier_collisions(&steps)?;

    Ok(ZonePlan {
        zone: config.name.clone(),
        token,
        execution_order,
        steps,
        outputs,
        to_create,
        to_reuse,
        skipped,
    })
}

/// A deployed resource must not reference a resource pruned by its
/// feature flag.
fn check_no_skipped_references(
    key: &str,
    spec: &ResourceSpec,
    skipped_keys: &HashSet<String>,
) -> Result<(), String> {
    let mut refs: Vec<&str> = spec.depends_on.iter().map(String::as_str).collect();
    if let Some(ref target) = spec.target {
        refs.push(target.as_str());
    }
    if let Some(ref principal) = spec.principal {
        refs.push(principal.as_str());
    }
    if let Some(ref subnet) = spec.subnet {
        refs.push(subnet.split('/').next().unwrap_or(""));
    }
    for r in refs {
        if skipped_keys.contains(r) {
            return Err(format!(
                "resource '{}' depends on '{}', which is not deployed",
                key, r
            ));
        }
    }
    Ok(())
}

/// Two resources resolving to the same identifier would shadow each other
/// at the provisioning engine.
fn check_no_identifier_collisions(steps: &[ResolvedResource]) -> Result<(), String> {
    let mut seen: std::collections::HashMap<&str, &str> = std::collections::HashMap::new();
    for step in steps {
        if step.action == ResolveAction::Skip {
            continue;
        }
        if let Some(first) = seen.insert(step.id.as_str(), step.key.as_str()) {
            return Err(format!(
                "resources '{}' and '{}' resolve to the same identifier '{}'",
                first, step.key, step.id
            ));
        }
    }
    Ok(())
}

fn output_value(step: &ResolvedResource, spec: &ResourceSpec) -> OutputValue {
    let mut subnets = IndexMap::new();
    if step.kind == ResourceKind::VirtualNetwork {
        for subnet in &spec.subnets {
            subnets.insert(subnet.clone(), format!("{}/subnets/{}", step.id, subnet));
        }
    }
    OutputValue {
        name: step.name.clone(),
        id: step.id.clone(),
        endpoint: step.endpoint.clone(),
        subnets,
    }
}

fn describe(key: &str, spec: &ResourceSpec, action: ResolveAction, name: &str) -> String {
    match action {
        ResolveAction::Create => match spec.kind {
            ResourceKind::RoleAssignment => format!(
                "{}: assign '{}' on '{}'",
                key,
                spec.role.as_deref().unwrap_or("?"),
                spec.target.as_deref().unwrap_or("?")
            ),
            ResourceKind::PrivateEndpoint => format!(
                "{}: create {} fronting '{}'",
                key,
                name,
                spec.target.as_deref().unwrap_or("?")
            ),
            _ => format!("{}: create {}", key, name),
        },
        ResolveAction::Reuse => format!("{}: reuse {}", key, name),
        ResolveAction::Skip => format!("{}: skipped (deploy = false)", key),
    }
}
