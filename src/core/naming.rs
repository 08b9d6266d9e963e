//! Per-kind naming metadata — default prefixes, provider paths, endpoint
//! templates, and name rules.
//!
//! Generated default names are `prefix + deployment token` and always
//! satisfy the kind's name rule; explicit names are checked at validate
//! time.

use super::types::ResourceKind;
use regex::Regex;
use std::sync::OnceLock;

/// Character rule a resource name must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// Lowercase letters and digits only (storage accounts, registries)
    LowerAlnum { min: usize, max: usize },
    /// Letters, digits, dots, underscores, and hyphens
    Standard { max: usize },
}

/// Static naming metadata for one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct KindInfo {
    /// Default name prefix
    pub prefix: &'static str,
    /// Provider path used when composing identifiers
    pub provider: &'static str,
    /// Name rule
    pub rule: NameRule,
}

/// Look up the naming metadata for a kind.
pub fn kind_info(kind: ResourceKind) -> KindInfo {
    use ResourceKind::*;
    match kind {
        VirtualNetwork => KindInfo {
            prefix: "vnet-",
            provider: "Microsoft.Network/virtualNetworks",
            rule: NameRule::Standard { max: 64 },
        },
        PrivateEndpoint => KindInfo {
            prefix: "pe-",
            provider: "Microsoft.Network/privateEndpoints",
            rule: NameRule::Standard { max: 64 },
        },
        PrivateDnsZone => KindInfo {
            prefix: "dns-",
            provider: "Microsoft.Network/privateDnsZones",
            rule: NameRule::Standard { max: 63 },
        },
        LogAnalytics => KindInfo {
            prefix: "log-",
            provider: "Microsoft.OperationalInsights/workspaces",
            rule: NameRule::Standard { max: 63 },
        },
        AppInsights => KindInfo {
            prefix: "appi-",
            provider: "Microsoft.Insights/components",
            rule: NameRule::Standard { max: 64 },
        },
        ContainerRegistry => KindInfo {
            prefix: "cr",
            provider: "Microsoft.ContainerRegistry/registries",
            rule: NameRule::LowerAlnum { min: 5, max: 50 },
        },
        ContainerEnvironment => KindInfo {
            prefix: "cae-",
            provider: "Microsoft.App/managedEnvironments",
            rule: NameRule::Standard { max: 60 },
        },
        KeyVault => KindInfo {
            prefix: "kv-",
            provider: "Microsoft.KeyVault/vaults",
            rule: NameRule::Standard { max: 24 },
        },
        StorageAccount => KindInfo {
            prefix: "st",
            provider: "Microsoft.Storage/storageAccounts",
            rule: NameRule::LowerAlnum { min: 3, max: 24 },
        },
        CosmosDb => KindInfo {
            prefix: "cosmos-",
            provider: "Microsoft.DocumentDB/databaseAccounts",
            rule: NameRule::Standard { max: 44 },
        },
        AiSearch => KindInfo {
            prefix: "srch-",
            provider: "Microsoft.Search/searchServices",
            rule: NameRule::Standard { max: 60 },
        },
        AiAccount => KindInfo {
            prefix: "aif-",
            provider: "Microsoft.CognitiveServices/accounts",
            rule: NameRule::Standard { max: 64 },
        },
        AiProject => KindInfo {
            prefix: "proj-",
            provider: "Microsoft.CognitiveServices/projects",
            rule: NameRule::Standard { max: 64 },
        },
        CapabilityHost => KindInfo {
            prefix: "caphost-",
            provider: "Microsoft.CognitiveServices/capabilityHosts",
            rule: NameRule::Standard { max: 64 },
        },
        RoleAssignment => KindInfo {
            prefix: "ra-",
            provider: "Microsoft.Authorization/roleAssignments",
            rule: NameRule::Standard { max: 64 },
        },
        Bastion => KindInfo {
            prefix: "bas-",
            provider: "Microsoft.Network/bastionHosts",
            rule: NameRule::Standard { max: 64 },
        },
        Firewall => KindInfo {
            prefix: "afw-",
            provider: "Microsoft.Network/azureFirewalls",
            rule: NameRule::Standard { max: 64 },
        },
        ApiManagement => KindInfo {
            prefix: "apim-",
            provider: "Microsoft.ApiManagement/service",
            rule: NameRule::Standard { max: 50 },
        },
        AppConfig => KindInfo {
            prefix: "appcs-",
            provider: "Microsoft.AppConfiguration/configurationStores",
            rule: NameRule::Standard { max: 50 },
        },
    }
}

/// Generate the default name for a kind from the deployment token.
pub fn default_name(kind: ResourceKind, token: &str) -> String {
    format!("{}{}", kind_info(kind).prefix, token)
}

fn lower_alnum_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[a-z0-9]+$").unwrap())
}

fn standard_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

/// Validate an explicit name against the kind's rule.
pub fn validate_name(kind: ResourceKind, name: &str) -> Result<(), String> {
    match kind_info(kind).rule {
        NameRule::LowerAlnum { min, max } => {
            if name.len() < min || name.len() > max {
                return Err(format!(
                    "{} name '{}' must be {}-{} characters",
                    kind, name, min, max
                ));
            }
            if !lower_alnum_re().is_match(name) {
                return Err(format!(
                    "{} name '{}' must be lowercase letters and digits only",
                    kind, name
                ));
            }
        }
        NameRule::Standard { max } => {
            if name.is_empty() || name.len() > max {
                return Err(format!(
                    "{} name '{}' must be 1-{} characters",
                    kind, name, max
                ));
            }
            if !standard_re().is_match(name) {
                return Err(format!(
                    "{} name '{}' contains invalid characters",
                    kind, name
                ));
            }
        }
    }
    Ok(())
}

/// Data-plane endpoint for kinds that expose one.
pub fn endpoint(kind: ResourceKind, name: &str) -> Option<String> {
    use ResourceKind::*;
    match kind {
        KeyVault => Some(format!("https://{}.vault.azure.net", name)),
        StorageAccount => Some(format!("https://{}.blob.core.windows.net", name)),
        CosmosDb => Some(format!("https://{}.documents.azure.com", name)),
        AiSearch => Some(format!("https://{}.search.windows.net", name)),
        AiAccount => Some(format!("https://{}.cognitiveservices.azure.com", name)),
        ContainerRegistry => Some(format!("{}.azurecr.io", name)),
        AppConfig => Some(format!("https://{}.azconfig.io", name)),
        ApiManagement => Some(format!("https://{}.azure-api.net", name)),
        _ => None,
    }
}
