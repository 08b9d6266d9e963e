//! Create-or-reuse resolution over fully-qualified resource identifiers.
//!
//! An empty existing identifier means create; anything non-empty means
//! reuse, with subscription, resource group, and name extracted by
//! position. Extraction is lenient: identifiers shorter than expected
//! yield empty fields, never an error. Strictness lives in
//! `is_well_formed`, which the validator and planner consult when
//! `policy.strict_ids` is set.

use super::naming;
use super::types::{ResourceKind, Scope};
use serde::{Deserialize, Serialize};

/// Segment count of a fully-qualified identifier once split on '/'
/// (the leading slash contributes an empty first segment).
const FULL_ID_SEGMENTS: usize = 9;

/// Length of the deployment token in hex characters.
const TOKEN_LEN: usize = 13;

/// Extracted components of an identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription: String,
    pub resource_group: String,
    pub name: String,
    pub raw: String,
}

/// Resolved reference: either a resource to create or one to reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ResourceRef {
    Create {
        name: String,
    },
    Reuse {
        subscription: String,
        resource_group: String,
        name: String,
        id: String,
    },
}

/// Extract subscription (segment 2), resource group (segment 4), and name
/// (last segment) from an identifier. Missing segments come back empty.
pub fn parse_resource_id(id: &str) -> ResourceId {
    let parts: Vec<&str> = id.split('/').collect();
    let seg = |i: usize| parts.get(i).map(|s| (*s).to_string()).unwrap_or_default();
    let name = if parts.len() >= FULL_ID_SEGMENTS {
        parts.last().map(|s| (*s).to_string()).unwrap_or_default()
    } else {
        String::new()
    };
    ResourceId {
        subscription: seg(2),
        resource_group: seg(4),
        name,
        raw: id.to_string(),
    }
}

/// Structural check for a fully-qualified identifier: the fixed markers in
/// place, every variable segment non-empty, and type/name segments paired
/// (child resources append two segments at a time, keeping the count odd).
pub fn is_well_formed(id: &str) -> bool {
    let parts: Vec<&str> = id.split('/').collect();
    parts.len() >= FULL_ID_SEGMENTS
        && parts.len() % 2 == 1
        && parts[0].is_empty()
        && parts[1] == "subscriptions"
        && parts[3] == "resourceGroups"
        && parts[5] == "providers"
        && parts[2..].iter().all(|s| !s.is_empty())
}

/// Decide create vs reuse for one resource.
///
/// Empty `existing_id` means create, named either explicitly or from the
/// kind prefix and deployment token. Non-empty means reuse, with the
/// segments extracted for cross-scope references.
pub fn resolve(
    existing_id: &str,
    desired_name: Option<&str>,
    kind: ResourceKind,
    token: &str,
) -> ResourceRef {
    if existing_id.is_empty() {
        let name = desired_name
            .map(str::to_string)
            .unwrap_or_else(|| naming::default_name(kind, token));
        ResourceRef::Create { name }
    } else {
        let parsed = parse_resource_id(existing_id);
        ResourceRef::Reuse {
            subscription: parsed.subscription,
            resource_group: parsed.resource_group,
            name: parsed.name,
            id: parsed.raw,
        }
    }
}

/// Deterministic token derived from subscription, resource group, and
/// region. Same scope, same token — default names are stable across runs.
pub fn deployment_token(scope: &Scope) -> String {
    let seed = format!(
        "{}\0{}\0{}",
        scope.subscription, scope.resource_group, scope.location
    );
    let hex = blake3::hash(seed.as_bytes()).to_hex();
    hex.as_str()[..TOKEN_LEN].to_string()
}

/// Compose the full identifier for a resource created in this scope.
pub fn compose_id(scope: &Scope, kind: ResourceKind, name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
        scope.subscription,
        scope.resource_group,
        naming::kind_info(kind).provider,
        name
    )
}
