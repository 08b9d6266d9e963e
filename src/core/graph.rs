//! Dependency ordering.
//!
//! The execution order is a topological sort over three edge sources:
//! explicit `depends_on`, a fixed kind-pair table (the landing-zone
//! partial order), and structural references (private endpoint targets,
//! role assignment scopes and principals). Kahn's algorithm with
//! alphabetical tie-breaking keeps the order deterministic.

use super::types::{ResourceKind, ZoneConfig};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Fixed ordering between kinds: every resource of the left kind precedes
/// every resource of the right kind.
const KIND_ORDER: &[(ResourceKind, ResourceKind)] = &[
    (ResourceKind::AiSearch, ResourceKind::AiAccount),
    (ResourceKind::StorageAccount, ResourceKind::AiAccount),
    (ResourceKind::CosmosDb, ResourceKind::AiAccount),
    (ResourceKind::AiAccount, ResourceKind::AiProject),
    (ResourceKind::AiProject, ResourceKind::CapabilityHost),
    (ResourceKind::LogAnalytics, ResourceKind::AppInsights),
    (ResourceKind::LogAnalytics, ResourceKind::ContainerEnvironment),
    (ResourceKind::VirtualNetwork, ResourceKind::Bastion),
    (ResourceKind::VirtualNetwork, ResourceKind::Firewall),
];

fn push_edge(
    from: &str,
    to: &str,
    edges: &mut Vec<(String, String)>,
    seen: &mut FxHashSet<(String, String)>,
) {
    if from == to {
        return;
    }
    let key = (from.to_string(), to.to_string());
    if seen.insert(key.clone()) {
        edges.push(key);
    }
}

/// Collect every dependency edge (from, to) meaning "from before to".
pub fn dependency_edges(config: &ZoneConfig) -> Result<Vec<(String, String)>, String> {
    let mut edges = Vec::new();
    let mut seen = FxHashSet::default();

    // Explicit depends_on
    for (key, spec) in &config.resources {
        for dep in &spec.depends_on {
            if !config.resources.contains_key(dep) {
                return Err(format!("resource '{}' depends on unknown '{}'", key, dep));
            }
            push_edge(dep, key, &mut edges, &mut seen);
        }
    }

    // Fixed kind pairs
    for (before, after) in KIND_ORDER {
        for (a_key, a) in &config.resources {
            if a.kind != *before {
                continue;
            }
            for (b_key, b) in &config.resources {
                if b.kind == *after {
                    push_edge(a_key, b_key, &mut edges, &mut seen);
                }
            }
        }
    }

    // Structural references and the role-assignment phases
    for (key, spec) in &config.resources {
        match spec.kind {
            ResourceKind::PrivateEndpoint => {
                if let Some(ref target) = spec.target {
                    if !config.resources.contains_key(target) {
                        return Err(format!(
                            "private endpoint '{}' fronts unknown resource '{}'",
                            key, target
                        ));
                    }
                    push_edge(target, key, &mut edges, &mut seen);
                }
                if let Some(ref subnet) = spec.subnet {
                    let vnet = subnet.split('/').next().unwrap_or("");
                    if !config.resources.contains_key(vnet) {
                        return Err(format!(
                            "private endpoint '{}' placed in unknown virtual network '{}'",
                            key, vnet
                        ));
                    }
                    push_edge(vnet, key, &mut edges, &mut seen);
                }
            }
            ResourceKind::RoleAssignment => {
                if let Some(ref target) = spec.target {
                    if !config.resources.contains_key(target) {
                        return Err(format!(
                            "role assignment '{}' scoped to unknown resource '{}'",
                            key, target
                        ));
                    }
                    push_edge(target, key, &mut edges, &mut seen);
                }
                if let Some(ref principal) = spec.principal {
                    if !config.resources.contains_key(principal) {
                        return Err(format!(
                            "role assignment '{}' grants to unknown resource '{}'",
                            key, principal
                        ));
                    }
                    push_edge(principal, key, &mut edges, &mut seen);
                }

                // Assignments follow the account/project pair; the capability
                // host follows the assignments, except container-scoped
                // assignments which follow the capability host.
                let container_scoped = spec
                    .target
                    .as_ref()
                    .and_then(|t| config.resources.get(t))
                    .map(|t| {
                        matches!(
                            t.kind,
                            ResourceKind::ContainerRegistry | ResourceKind::ContainerEnvironment
                        )
                    })
                    .unwrap_or(false);

                for (other_key, other) in &config.resources {
                    match other.kind {
                        ResourceKind::AiProject => {
                            push_edge(other_key, key, &mut edges, &mut seen);
                        }
                        ResourceKind::CapabilityHost => {
                            if container_scoped {
                                push_edge(other_key, key, &mut edges, &mut seen);
                            } else {
                                push_edge(key, other_key, &mut edges, &mut seen);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    Ok(edges)
}

/// Topological execution order over all declared resources.
pub fn build_execution_order(config: &ZoneConfig) -> Result<Vec<String>, String> {
    let keys: Vec<String> = config.resources.keys().cloned().collect();
    let mut in_degree: FxHashMap<String, usize> = FxHashMap::default();
    let mut adjacency: FxHashMap<String, Vec<String>> = FxHashMap::default();

    for key in &keys {
        in_degree.insert(key.clone(), 0);
        adjacency.insert(key.clone(), Vec::new());
    }

    for (from, to) in dependency_edges(config)? {
        adjacency.get_mut(&from).unwrap().push(to.clone());
        *in_degree.get_mut(&to).unwrap() += 1;
    }

    // Kahn with sorted tie-breaking
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut ready: Vec<String> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(key, _)| key.clone())
        .collect();
    ready.sort();
    queue.extend(ready);

    let mut order = Vec::with_capacity(keys.len());
    while let Some(current) = queue.pop_front() {
        order.push(current.clone());

        let mut next_ready = Vec::new();
        if let Some(neighbors) = adjacency.get(&current) {
            for neighbor in neighbors {
                let degree = in_degree.get_mut(neighbor).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    next_ready.push(neighbor.clone());
                }
            }
        }
        next_ready.sort();
        queue.extend(next_ready);
    }

    if order.len() != keys.len() {
        let mut remaining: Vec<&String> =
            keys.iter().filter(|k| !order.contains(*k)).collect();
        remaining.sort();
        return Err(format!(
            "dependency cycle detected involving: {}",
            remaining
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ZoneConfig;

    fn parse(yaml: &str) -> ZoneConfig {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn pos(order: &[String], key: &str) -> usize {
        order.iter().position(|k| k == key).unwrap()
    }

    const HEADER: &str = r#"
version: "1.0"
name: test
scope:
  subscription: s
  resource_group: g
  location: eastus2
"#;

    #[test]
    fn test_linear_chain() {
        let config = parse(&format!(
            "{HEADER}resources:
  a:
    kind: log_analytics
  b:
    kind: key_vault
    depends_on: [a]
  c:
    kind: app_config
    depends_on: [b]
"
        ));
        let order = build_execution_order(&config).unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_alphabetical_tie_break() {
        let config = parse(&format!(
            "{HEADER}resources:
  zeta:
    kind: key_vault
  alpha:
    kind: app_config
"
        ));
        let order = build_execution_order(&config).unwrap();
        assert_eq!(order, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_diamond() {
        let config = parse(&format!(
            "{HEADER}resources:
  top:
    kind: log_analytics
  left:
    kind: key_vault
    depends_on: [top]
  right:
    kind: app_config
    depends_on: [top]
  bottom:
    kind: container_registry
    depends_on: [left, right]
"
        ));
        let order = build_execution_order(&config).unwrap();
        assert_eq!(order, vec!["top", "left", "right", "bottom"]);
    }

    #[test]
    fn test_cycle_detected() {
        let config = parse(&format!(
            "{HEADER}resources:
  a:
    kind: key_vault
    depends_on: [b]
  b:
    kind: app_config
    depends_on: [a]
"
        ));
        let err = build_execution_order(&config).unwrap_err();
        assert!(err.contains("cycle"));
        assert!(err.contains("a"));
        assert!(err.contains("b"));
    }

    #[test]
    fn test_unknown_dependency() {
        let config = parse(&format!(
            "{HEADER}resources:
  a:
    kind: key_vault
    depends_on: [ghost]
"
        ));
        let err = build_execution_order(&config).unwrap_err();
        assert!(err.contains("unknown 'ghost'"));
    }

    #[test]
    fn test_agent_platform_ordering() {
        let config = parse(&format!(
            "{HEADER}resources:
  registry:
    kind: container_registry
  search:
    kind: ai_search
  storage:
    kind: storage_account
  cosmos:
    kind: cosmos_db
  account:
    kind: ai_account
  project:
    kind: ai_project
  data-role:
    kind: role_assignment
    target: storage
    principal: project
    role: Storage Blob Data Contributor
  caphost:
    kind: capability_host
  acr-role:
    kind: role_assignment
    target: registry
    principal: project
    role: AcrPull
"
        ));
        let order = build_execution_order(&config).unwrap();

        // data/search/storage before the account
        assert!(pos(&order, "search") < pos(&order, "account"));
        assert!(pos(&order, "storage") < pos(&order, "account"));
        assert!(pos(&order, "cosmos") < pos(&order, "account"));
        // account before project, project before the capability host
        assert!(pos(&order, "account") < pos(&order, "project"));
        assert!(pos(&order, "project") < pos(&order, "caphost"));
        // project before role assignments
        assert!(pos(&order, "project") < pos(&order, "data-role"));
        // role assignments before the capability host
        assert!(pos(&order, "data-role") < pos(&order, "caphost"));
        // container-scoped assignment after the capability host
        assert!(pos(&order, "caphost") < pos(&order, "acr-role"));
    }

    #[test]
    fn test_private_endpoint_follows_target_and_vnet() {
        let config = parse(&format!(
            "{HEADER}resources:
  vnet:
    kind: virtual_network
    subnets: [endpoints]
  storage:
    kind: storage_account
  storage-pe:
    kind: private_endpoint
    target: storage
    subnet: vnet/endpoints
"
        ));
        let order = build_execution_order(&config).unwrap();
        assert!(pos(&order, "storage") < pos(&order, "storage-pe"));
        assert!(pos(&order, "vnet") < pos(&order, "storage-pe"));
    }

    #[test]
    fn test_private_endpoint_unknown_vnet() {
        let config = parse(&format!(
            "{HEADER}resources:
  storage:
    kind: storage_account
  storage-pe:
    kind: private_endpoint
    target: storage
    subnet: ghost/endpoints
"
        ));
        let err = build_execution_order(&config).unwrap_err();
        assert!(err.contains("unknown virtual network"));
    }

    #[test]
    fn test_observability_and_network_kind_order() {
        let config = parse(&format!(
            "{HEADER}resources:
  insights:
    kind: app_insights
  logs:
    kind: log_analytics
  apps-env:
    kind: container_environment
  vnet:
    kind: virtual_network
  bastion:
    kind: bastion
  firewall:
    kind: firewall
"
        ));
        let order = build_execution_order(&config).unwrap();
        assert!(pos(&order, "logs") < pos(&order, "insights"));
        assert!(pos(&order, "logs") < pos(&order, "apps-env"));
        assert!(pos(&order, "vnet") < pos(&order, "bastion"));
        assert!(pos(&order, "vnet") < pos(&order, "firewall"));
    }

    #[test]
    fn test_explicit_edge_duplicating_implicit() {
        let config = parse(&format!(
            "{HEADER}resources:
  logs:
    kind: log_analytics
  insights:
    kind: app_insights
    depends_on: [logs]
"
        ));
        // Same edge from both sources must not double-count
        let edges = dependency_edges(&config).unwrap();
        let count = edges
            .iter()
            .filter(|(f, t)| f == "logs" && t == "insights")
            .count();
        assert_eq!(count, 1);
        let order = build_execution_order(&config).unwrap();
        assert_eq!(order, vec!["logs", "insights"]);
    }

    #[test]
    fn test_role_assignment_unknown_scope() {
        let config = parse(&format!(
            "{HEADER}resources:
  ra:
    kind: role_assignment
    target: ghost
    role: Reader
"
        ));
        let err = build_execution_order(&config).unwrap_err();
        assert!(err.contains("unknown resource 'ghost'"));
    }

    #[test]
    fn test_empty_manifest() {
        let config = parse(&format!("{HEADER}resources: {{}}\n"));
        let order = build_execution_order(&config).unwrap();
        assert!(order.is_empty());
    }
}
