//! Template substitution for manifest string fields.
//!
//! Supports `{{params.key}}`, `{{scope.subscription}}`,
//! `{{scope.resource_group}}`, `{{scope.location}}`, and `{{token}}`.
//! Unknown variables are errors, not silent passthrough.

use super::types::{yaml_value_to_string, ResourceSpec, Scope};
use std::collections::HashMap;

/// Resolve all template variables in a string.
pub fn resolve_template(
    template: &str,
    params: &HashMap<String, serde_yaml_ng::Value>,
    scope: &Scope,
    token: &str,
) -> Result<String, String> {
    let mut result = template.to_string();
    let mut start = 0;

    while let Some(open) = result[start..].find("{{") {
        let open = start + open;
        let close = result[open..]
            .find("}}")
            .ok_or_else(|| format!("unclosed template at position {}", open))?;
        let close = open + close + 2;
        let key = result[open + 2..close - 2].trim();

        let value = if let Some(param_key) = key.strip_prefix("params.") {
            params
                .get(param_key)
                .map(yaml_value_to_string)
                .ok_or_else(|| format!("unknown param: {}", param_key))?
        } else if let Some(field) = key.strip_prefix("scope.") {
            match field {
                "subscription" => scope.subscription.clone(),
                "resource_group" => scope.resource_group.clone(),
                "location" => scope.location.clone(),
                other => return Err(format!("unknown scope field: {}", other)),
            }
        } else if key == "token" {
            token.to_string()
        } else {
            return Err(format!("unknown template variable: {}", key));
        };

        result.replace_range(open..close, &value);
        start = open + value.len();
    }

    Ok(result)
}

/// Resolve templates in every string field of a resource spec.
pub fn resolve_spec(
    spec: &ResourceSpec,
    params: &HashMap<String, serde_yaml_ng::Value>,
    scope: &Scope,
    token: &str,
) -> Result<ResourceSpec, String> {
    let mut resolved = spec.clone();
    let expand = |s: &str| resolve_template(s, params, scope, token);

    if let Some(ref v) = resolved.existing_id {
        resolved.existing_id = Some(expand(v)?);
    }
    if let Some(ref v) = resolved.name {
        resolved.name = Some(expand(v)?);
    }
    if let Some(ref v) = resolved.sku {
        resolved.sku = Some(expand(v)?);
    }
    if let Some(ref v) = resolved.zone_name {
        resolved.zone_name = Some(expand(v)?);
    }
    if let Some(ref v) = resolved.target {
        resolved.target = Some(expand(v)?);
    }
    if let Some(ref v) = resolved.subnet {
        resolved.subnet = Some(expand(v)?);
    }
    if let Some(ref v) = resolved.role {
        resolved.role = Some(expand(v)?);
    }
    if let Some(ref v) = resolved.principal {
        resolved.principal = Some(expand(v)?);
    }
    for value in resolved.tags.values_mut() {
        *value = expand(value)?;
    }
    for entry in resolved.address_space.iter_mut() {
        *entry = expand(entry)?;
    }
    for entry in resolved.allowed_ip_ranges.iter_mut() {
        *entry = expand(entry)?;
    }
    for entry in resolved.subnets.iter_mut() {
        *entry = expand(entry)?;
    }

    Ok(resolved)
}
