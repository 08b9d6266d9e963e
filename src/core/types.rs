//! Manifest and plan types.
//!
//! Defines the YAML schema for zone manifests (scope, resources, policy),
//! the resolved-plan types produced by the planner, snapshot records, and
//! run-log events. All persisted types derive Serialize/Deserialize.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Top-level zone.yaml
// ============================================================================

/// Root manifest — the desired topology of one landing zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Schema version (must be "1.0")
    pub version: String,

    /// Zone name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Deployment target and token seed
    pub scope: Scope,

    /// Global parameters (templatable)
    #[serde(default)]
    pub params: HashMap<String, serde_yaml_ng::Value>,

    /// Resource declarations (order-preserving)
    pub resources: IndexMap<String, ResourceSpec>,

    /// Evaluation policy
    #[serde(default)]
    pub policy: Policy,
}

/// Deployment target: subscription, resource group, and region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub subscription: String,
    pub resource_group: String,
    pub location: String,
}

// ============================================================================
// Resources
// ============================================================================

/// Desired state of a single resource. Most fields are optional with
/// defaults; which ones apply depends on the kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Resource kind
    pub kind: ResourceKind,

    /// Feature flag: create this resource at all
    #[serde(default = "default_true")]
    pub deploy: bool,

    /// Fully-qualified identifier of a pre-existing resource.
    /// Non-empty means reuse instead of create.
    #[serde(default)]
    pub existing_id: Option<String>,

    /// Explicit name; generated from kind prefix + token when absent
    #[serde(default)]
    pub name: Option<String>,

    /// SKU / pricing tier
    #[serde(default)]
    pub sku: Option<String>,

    /// Resource tags
    #[serde(default)]
    pub tags: IndexMap<String, String>,

    // -- Network rules --
    #[serde(default)]
    pub public_network_access: Option<bool>,

    #[serde(default)]
    pub allowed_ip_ranges: Vec<String>,

    // -- Virtual network fields --
    /// CIDR ranges
    #[serde(default)]
    pub address_space: Vec<String>,

    /// Subnet names (subnet IDs are derived)
    #[serde(default)]
    pub subnets: Vec<String>,

    // -- Private DNS zone fields --
    /// Zone FQDN (e.g. "privatelink.blob.core.windows.net")
    #[serde(default)]
    pub zone_name: Option<String>,

    // -- Private endpoint / role assignment fields --
    /// Resource key this endpoint fronts, or the scope of a role assignment
    #[serde(default)]
    pub target: Option<String>,

    /// Placement as "<vnet-key>/<subnet-name>"
    #[serde(default)]
    pub subnet: Option<String>,

    /// Role definition name for role assignments
    #[serde(default)]
    pub role: Option<String>,

    /// Resource key whose identity receives the role
    #[serde(default)]
    pub principal: Option<String>,

    /// Explicit dependencies (other resource keys)
    #[serde(default)]
    pub depends_on: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            kind: ResourceKind::default(),
            deploy: true,
            existing_id: None,
            name: None,
            sku: None,
            tags: IndexMap::new(),
            public_network_access: None,
            allowed_ip_ranges: Vec::new(),
            address_space: Vec::new(),
            subnets: Vec::new(),
            zone_name: None,
            target: None,
            subnet: None,
            role: None,
            principal: None,
            depends_on: Vec::new(),
        }
    }
}

/// Resource kind enum — the landing-zone vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[default]
    VirtualNetwork,
    PrivateEndpoint,
    PrivateDnsZone,
    LogAnalytics,
    AppInsights,
    ContainerRegistry,
    ContainerEnvironment,
    KeyVault,
    StorageAccount,
    CosmosDb,
    AiSearch,
    AiAccount,
    AiProject,
    CapabilityHost,
    RoleAssignment,
    Bastion,
    Firewall,
    ApiManagement,
    AppConfig,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::VirtualNetwork => "virtual_network",
            Self::PrivateEndpoint => "private_endpoint",
            Self::PrivateDnsZone => "private_dns_zone",
            Self::LogAnalytics => "log_analytics",
            Self::AppInsights => "app_insights",
            Self::ContainerRegistry => "container_registry",
            Self::ContainerEnvironment => "container_environment",
            Self::KeyVault => "key_vault",
            Self::StorageAccount => "storage_account",
            Self::CosmosDb => "cosmos_db",
            Self::AiSearch => "ai_search",
            Self::AiAccount => "ai_account",
            Self::AiProject => "ai_project",
            Self::CapabilityHost => "capability_host",
            Self::RoleAssignment => "role_assignment",
            Self::Bastion => "bastion",
            Self::Firewall => "firewall",
            Self::ApiManagement => "api_management",
            Self::AppConfig => "app_config",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Evaluation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Append JSONL run events on every resolve
    #[serde(default = "default_true")]
    pub run_log: bool,

    /// Persist a plan snapshot after resolve
    #[serde(default = "default_true")]
    pub snapshot: bool,

    /// Reject malformed existing identifiers instead of trusting them
    #[serde(default = "default_true")]
    pub strict_ids: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            run_log: true,
            snapshot: true,
            strict_ids: true,
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Decision taken for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveAction {
    Create,
    Reuse,
    Skip,
}

impl fmt::Display for ResolveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Reuse => write!(f, "REUSE"),
            Self::Skip => write!(f, "SKIP"),
        }
    }
}

/// One fully resolved resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedResource {
    /// Manifest key
    pub key: String,

    /// Resource kind
    pub kind: ResourceKind,

    /// Decision
    pub action: ResolveAction,

    /// Resolved name (empty for skipped resources)
    pub name: String,

    /// Full identifier (supplied for reuse, composed for create, empty for skip)
    pub id: String,

    /// Data-plane endpoint, for kinds that expose one
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Subscription the resource lives in
    pub subscription: String,

    /// Resource group the resource lives in
    pub resource_group: String,

    /// Human-readable description
    pub description: String,
}

/// Output value handed to downstream deployment stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputValue {
    pub name: String,
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Derived subnet IDs, virtual networks only
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub subnets: IndexMap<String, String>,
}

/// Fully resolved zone plan.
#[derive(Debug, Clone)]
pub struct ZonePlan {
    /// Zone name
    pub zone: String,

    /// Deployment token the default names were derived from
    pub token: String,

    /// Topological execution order (resource keys, skips included)
    pub execution_order: Vec<String>,

    /// Resolved resources in execution order
    pub steps: Vec<ResolvedResource>,

    /// Outputs for downstream stages, keyed by resource key
    pub outputs: IndexMap<String, OutputValue>,

    /// Summary counts
    pub to_create: u32,
    pub to_reuse: u32,
    pub skipped: u32,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Persisted record of a resolved plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSnapshot {
    /// Schema version
    pub schema: String,

    /// Zone name
    pub zone: String,

    /// Deployment token
    pub token: String,

    /// When the snapshot was generated
    pub generated_at: String,

    /// Generator version
    pub generator: String,

    /// BLAKE3 digest over the resolved decisions
    pub digest: String,

    /// Resolved resources in execution order
    pub resources: IndexMap<String, ResolvedResource>,

    /// Outputs at resolve time
    pub outputs: IndexMap<String, OutputValue>,
}

// ============================================================================
// Run-log events
// ============================================================================

/// Event for the JSONL run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    ResolveStarted {
        zone: String,
        run_id: String,
        cimiento_version: String,
    },
    ResourceResolved {
        zone: String,
        resource: String,
        action: String,
        name: String,
    },
    ResolveCompleted {
        zone: String,
        run_id: String,
        created: u32,
        reused: u32,
        skipped: u32,
        total_seconds: f64,
    },
    DecisionDrift {
        zone: String,
        resource: String,
        field: String,
        expected: String,
        actual: String,
    },
}

/// Timestamped event wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub ts: String,
    #[serde(flatten)]
    pub event: RunEvent,
}

// ============================================================================
// Template helper
// ============================================================================

/// Convert a serde_yaml_ng::Value to a string for template substitution.
pub fn yaml_value_to_string(val: &serde_yaml_ng::Value) -> String {
    match val {
        serde_yaml_ng::Value::String(s) => s.clone(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Null => String::new(),
        other => format!("{:?}", other),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse() {
        let yaml = r#"
version: "1.0"
name: ai-zone
scope:
  subscription: 00000000-0000-0000-0000-000000000001
  resource_group: rg-ai
  location: eastus2
params:
  env: prod
resources:
  vnet:
    kind: virtual_network
    address_space: ["10.0.0.0/16"]
    subnets: [workload, endpoints]
  storage:
    kind: storage_account
    sku: Standard_LRS
    depends_on: [vnet]
policy:
  run_log: true
  snapshot: true
"#;
        let config: ZoneConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name, "ai-zone");
        assert_eq!(config.scope.location, "eastus2");
        assert_eq!(config.resources.len(), 2);
        assert_eq!(config.resources["vnet"].kind, ResourceKind::VirtualNetwork);
        assert_eq!(config.resources["vnet"].subnets, vec!["workload", "endpoints"]);
        assert_eq!(config.resources["storage"].depends_on, vec!["vnet"]);
    }

    #[test]
    fn test_spec_defaults() {
        let yaml = r#"
kind: key_vault
"#;
        let spec: ResourceSpec = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(spec.deploy);
        assert!(spec.existing_id.is_none());
        assert!(spec.name.is_none());
        assert!(spec.tags.is_empty());
        assert!(spec.depends_on.is_empty());
    }

    #[test]
    fn test_spec_existing_id() {
        let yaml = r#"
kind: virtual_network
existing_id: /subscriptions/abc/resourceGroups/hub/providers/Microsoft.Network/virtualNetworks/hub-vnet
"#;
        let spec: ResourceSpec = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(spec.existing_id.unwrap().contains("hub-vnet"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::VirtualNetwork.to_string(), "virtual_network");
        assert_eq!(ResourceKind::StorageAccount.to_string(), "storage_account");
        assert_eq!(ResourceKind::CapabilityHost.to_string(), "capability_host");
        assert_eq!(ResourceKind::AiSearch.to_string(), "ai_search");
    }

    #[test]
    fn test_kind_serde_snake_case() {
        let k: ResourceKind = serde_yaml_ng::from_str("role_assignment").unwrap();
        assert_eq!(k, ResourceKind::RoleAssignment);
        let s = serde_yaml_ng::to_string(&ResourceKind::CosmosDb).unwrap();
        assert_eq!(s.trim(), "cosmos_db");
    }

    #[test]
    fn test_policy_defaults() {
        let p = Policy::default();
        assert!(p.run_log);
        assert!(p.snapshot);
        assert!(p.strict_ids);
    }

    #[test]
    fn test_action_display() {
        assert_eq!(ResolveAction::Create.to_string(), "CREATE");
        assert_eq!(ResolveAction::Reuse.to_string(), "REUSE");
        assert_eq!(ResolveAction::Skip.to_string(), "SKIP");
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = PlanSnapshot {
            schema: "1.0".to_string(),
            zone: "ai-zone".to_string(),
            token: "x7k2m9qwerty0".to_string(),
            generated_at: "2026-08-05T12:00:00Z".to_string(),
            generator: "cimiento 0.3.0".to_string(),
            digest: "blake3:abc".to_string(),
            resources: IndexMap::from([(
                "storage".to_string(),
                ResolvedResource {
                    key: "storage".to_string(),
                    kind: ResourceKind::StorageAccount,
                    action: ResolveAction::Create,
                    name: "stx7k2m9qwerty0".to_string(),
                    id: "/subscriptions/s/resourceGroups/g/providers/Microsoft.Storage/storageAccounts/stx7k2m9qwerty0".to_string(),
                    endpoint: Some("https://stx7k2m9qwerty0.blob.core.windows.net".to_string()),
                    subscription: "s".to_string(),
                    resource_group: "g".to_string(),
                    description: "storage: create stx7k2m9qwerty0".to_string(),
                },
            )]),
            outputs: IndexMap::new(),
        };
        let yaml = serde_yaml_ng::to_string(&snapshot).unwrap();
        let back: PlanSnapshot = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back.zone, "ai-zone");
        assert_eq!(back.resources["storage"].action, ResolveAction::Create);
        assert_eq!(back.resources["storage"].kind, ResourceKind::StorageAccount);
    }

    #[test]
    fn test_run_event_serde() {
        let event = RunEvent::ResolveStarted {
            zone: "ai-zone".to_string(),
            run_id: "run-abc123".to_string(),
            cimiento_version: "0.3.0".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"resolve_started\""));
        assert!(json.contains("\"run_id\":\"run-abc123\""));
    }

    #[test]
    fn test_output_value_skips_empty_fields() {
        let out = OutputValue {
            name: "vnet-x".to_string(),
            id: "/subscriptions/s/resourceGroups/g/providers/Microsoft.Network/virtualNetworks/vnet-x".to_string(),
            endpoint: None,
            subnets: IndexMap::new(),
        };
        let yaml = serde_yaml_ng::to_string(&out).unwrap();
        assert!(!yaml.contains("endpoint"));
        assert!(!yaml.contains("subnets"));
    }

    #[test]
    fn test_yaml_value_to_string() {
        assert_eq!(
            yaml_value_to_string(&serde_yaml_ng::Value::String("prod".into())),
            "prod"
        );
        assert_eq!(yaml_value_to_string(&serde_yaml_ng::Value::Bool(false)), "false");
        assert_eq!(yaml_value_to_string(&serde_yaml_ng::Value::Null), "");
    }
}
