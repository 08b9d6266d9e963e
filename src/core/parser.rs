//! Manifest parsing and validation.
//!
//! Parses zone.yaml and validates structural constraints:
//! - Version must be "1.0", name and scope fields non-empty
//! - depends_on and structural references must exist
//! - Required fields per resource kind
//! - Explicit names must satisfy the kind's name rule
//! - Non-empty existing identifiers must be well-formed (strict_ids)
//!
//! Fields still carrying `{{...}}` templates are checked after expansion
//! by the planner, not here.

use super::naming;
use super::resolver;
use super::types::{ResourceKind, ResourceSpec, ZoneConfig};
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn error(errors: &mut Vec<ValidationError>, message: String) {
    errors.push(ValidationError { message });
}

fn is_templated(s: &str) -> bool {
    s.contains("{{")
}

/// Parse a zone.yaml file from disk.
pub fn parse_config_file(path: &Path) -> Result<ZoneConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_config(&content)
}

/// Parse a zone.yaml from a string.
pub fn parse_config(yaml: &str) -> Result<ZoneConfig, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Validate a parsed manifest. Returns a list of errors (empty = valid).
pub fn validate_config(config: &ZoneConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        error(
            &mut errors,
            format!("version must be \"1.0\", got \"{}\"", config.version),
        );
    }

    if config.name.is_empty() {
        error(&mut errors, "name must not be empty".to_string());
    }

    if config.scope.subscription.is_empty() {
        error(&mut errors, "scope.subscription must not be empty".to_string());
    }
    if config.scope.resource_group.is_empty() {
        error(&mut errors, "scope.resource_group must not be empty".to_string());
    }
    if config.scope.location.is_empty() {
        error(&mut errors, "scope.location must not be empty".to_string());
    }

    let has_account = config
        .resources
        .values()
        .any(|r| r.kind == ResourceKind::AiAccount);
    let has_project = config
        .resources
        .values()
        .any(|r| r.kind == ResourceKind::AiProject);

    for (key, spec) in &config.resources {
        validate_references(key, spec, config, &mut errors);
        validate_identifier(key, spec, config, &mut errors);
        validate_name(key, spec, &mut errors);
        validate_kind_fields(key, spec, has_account, has_project, &mut errors);
    }

    errors
}

fn validate_references(
    key: &str,
    spec: &ResourceSpec,
    config: &ZoneConfig,
    errors: &mut Vec<ValidationError>,
) {
    for dep in &spec.depends_on {
        if !config.resources.contains_key(dep) {
            error(
                errors,
                format!("resource '{}' depends on unknown resource '{}'", key, dep),
            );
        }
        if dep == key {
            error(errors, format!("resource '{}' depends on itself", key));
        }
    }

    if let Some(ref target) = spec.target {
        if !config.resources.contains_key(target) {
            error(
                errors,
                format!("resource '{}' references unknown resource '{}'", key, target),
            );
        }
    }
    if let Some(ref principal) = spec.principal {
        if !config.resources.contains_key(principal) {
            error(
                errors,
                format!(
                    "resource '{}' references unknown resource '{}'",
                    key, principal
                ),
            );
        }
    }
}

fn validate_identifier(
    key: &str,
    spec: &ResourceSpec,
    config: &ZoneConfig,
    errors: &mut Vec<ValidationError>,
) {
    if !config.policy.strict_ids {
        return;
    }
    if let Some(ref id) = spec.existing_id {
        if !id.is_empty() && !is_templated(id) && !resolver::is_well_formed(id) {
            error(
                errors,
                format!("resource '{}' has malformed existing_id '{}'", key, id),
            );
        }
    }
}

fn validate_name(key: &str, spec: &ResourceSpec, errors: &mut Vec<ValidationError>) {
    if let Some(ref name) = spec.name {
        if !is_templated(name) {
            if let Err(e) = naming::validate_name(spec.kind, name) {
                error(errors, format!("resource '{}': {}", key, e));
            }
        }
    }
}

fn validate_kind_fields(
    key: &str,
    spec: &ResourceSpec,
    has_account: bool,
    has_project: bool,
    errors: &mut Vec<ValidationError>,
) {
    let creating = spec.deploy && spec.existing_id.as_deref().unwrap_or("").is_empty();

    match spec.kind {
        ResourceKind::VirtualNetwork => {
            if creating && spec.address_space.is_empty() {
                error(
                    errors,
                    format!("resource '{}' (virtual_network) has no address_space", key),
                );
            }
        }
        ResourceKind::PrivateEndpoint => {
            if spec.target.is_none() {
                error(
                    errors,
                    format!("resource '{}' (private_endpoint) has no target", key),
                );
            }
            if let Some(ref subnet) = spec.subnet {
                if !subnet.contains('/') {
                    error(
                        errors,
                        format!(
                            "resource '{}' subnet must be '<vnet-key>/<subnet-name>', got '{}'",
                            key, subnet
                        ),
                    );
                }
            }
        }
        ResourceKind::PrivateDnsZone => {
            if creating && spec.name.is_none() && spec.zone_name.is_none() {
                error(
                    errors,
                    format!("resource '{}' (private_dns_zone) needs zone_name", key),
                );
            }
        }
        ResourceKind::RoleAssignment => {
            if spec.role.is_none() {
                error(
                    errors,
                    format!("resource '{}' (role_assignment) has no role", key),
                );
            }
            if spec.target.is_none() {
                error(
                    errors,
                    format!("resource '{}' (role_assignment) has no target", key),
                );
            }
        }
        ResourceKind::AiProject => {
            if creating && !has_account {
                error(
                    errors,
                    format!("resource '{}' (ai_project) requires an ai_account", key),
                );
            }
        }
        ResourceKind::CapabilityHost => {
            if creating && !has_project {
                error(
                    errors,
                    format!("resource '{}' (capability_host) requires an ai_project", key),
                );
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"
version: "1.0"
name: test
scope:
  subscription: s
  resource_group: g
  location: eastus2
"#;

    fn messages(config: &ZoneConfig) -> Vec<String> {
        validate_config(config)
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_parse_valid() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  vnet:
    kind: virtual_network
    address_space: [\"10.0.0.0/16\"]
  storage:
    kind: storage_account
    depends_on: [vnet]
"
        ))
        .unwrap();
        assert_eq!(config.name, "test");
        let errors = validate_config(&config);
        assert!(errors.is_empty(), "unexpected: {:?}", messages(&config));
    }

    #[test]
    fn test_bad_version() {
        let config = parse_config(
            r#"
version: "2.0"
name: test
scope:
  subscription: s
  resource_group: g
  location: eastus2
resources: {}
"#,
        )
        .unwrap();
        assert!(messages(&config).iter().any(|m| m.contains("version")));
    }

    #[test]
    fn test_empty_scope_fields() {
        let config = parse_config(
            r#"
version: "1.0"
name: test
scope:
  subscription: ""
  resource_group: g
  location: ""
resources: {}
"#,
        )
        .unwrap();
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("scope.subscription")));
        assert!(msgs.iter().any(|m| m.contains("scope.location")));
    }

    #[test]
    fn test_unknown_dependency() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  kv:
    kind: key_vault
    depends_on: [ghost]
"
        ))
        .unwrap();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("unknown resource 'ghost'")));
    }

    #[test]
    fn test_self_dependency() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  kv:
    kind: key_vault
    depends_on: [kv]
"
        ))
        .unwrap();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("depends on itself")));
    }

    #[test]
    fn test_malformed_existing_id_rejected() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  vnet:
    kind: virtual_network
    existing_id: /subscriptions/abc/wrong
"
        ))
        .unwrap();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("malformed existing_id")));
    }

    #[test]
    fn test_malformed_existing_id_allowed_when_lenient() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  vnet:
    kind: virtual_network
    existing_id: /subscriptions/abc/wrong
policy:
  strict_ids: false
"
        ))
        .unwrap();
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_templated_existing_id_deferred() {
        let config = parse_config(&format!(
            "{HEADER}params:
  hub: /not/checked/here
resources:
  vnet:
    kind: virtual_network
    existing_id: \"{{{{params.hub}}}}\"
"
        ))
        .unwrap();
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_invalid_explicit_name() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  storage:
    kind: storage_account
    name: My-Storage
"
        ))
        .unwrap();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("lowercase letters and digits")));
    }

    #[test]
    fn test_vnet_requires_address_space() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  vnet:
    kind: virtual_network
"
        ))
        .unwrap();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("no address_space")));
    }

    #[test]
    fn test_reused_vnet_needs_no_address_space() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  vnet:
    kind: virtual_network
    existing_id: /subscriptions/abc/resourceGroups/hub/providers/Microsoft.Network/virtualNetworks/hub-vnet
"
        ))
        .unwrap();
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_role_assignment_requires_role_and_target() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  ra:
    kind: role_assignment
"
        ))
        .unwrap();
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("has no role")));
        assert!(msgs.iter().any(|m| m.contains("has no target")));
    }

    #[test]
    fn test_private_endpoint_requires_target() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  pe:
    kind: private_endpoint
    subnet: bad-format
"
        ))
        .unwrap();
        let msgs = messages(&config);
        assert!(msgs.iter().any(|m| m.contains("has no target")));
        assert!(msgs.iter().any(|m| m.contains("<vnet-key>/<subnet-name>")));
    }

    #[test]
    fn test_dns_zone_requires_zone_name() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  dns:
    kind: private_dns_zone
"
        ))
        .unwrap();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("needs zone_name")));
    }

    #[test]
    fn test_project_requires_account() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  project:
    kind: ai_project
"
        ))
        .unwrap();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("requires an ai_account")));
    }

    #[test]
    fn test_capability_host_requires_project() {
        let config = parse_config(&format!(
            "{HEADER}resources:
  caphost:
    kind: capability_host
"
        ))
        .unwrap();
        assert!(messages(&config)
            .iter()
            .any(|m| m.contains("requires an ai_project")));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zone.yaml");
        std::fs::write(
            &path,
            r#"
version: "1.0"
name: file-test
scope:
  subscription: s
  resource_group: g
  location: eastus2
resources: {}
"#,
        )
        .unwrap();
        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.name, "file-test");
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_config_file(Path::new("/nonexistent/zone.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_config("not: [valid: yaml: {{");
        assert!(result.is_err());
    }
}
