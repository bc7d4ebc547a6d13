//! DHCP server configuration and static leases

use super::null_as_default;
use crate::merge::Mergeable;
use serde::{Deserialize, Serialize};

/// IPv4 DHCP settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpV4Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_duration: Option<u64>,
}

impl DhcpV4Config {
    /// Gateway, subnet mask and range are all set and non-empty
    pub fn is_valid(&self) -> bool {
        [
            &self.gateway_ip,
            &self.subnet_mask,
            &self.range_start,
            &self.range_end,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

/// IPv6 DHCP settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpV6Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_duration: Option<u64>,
}

impl DhcpV6Config {
    /// Range start is set and non-empty
    pub fn is_valid(&self) -> bool {
        self.range_start.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// A fixed MAC to IP assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticLease {
    pub mac: String,
    pub ip: String,
    #[serde(default)]
    pub hostname: String,
}

impl StaticLease {
    pub fn new(mac: impl Into<String>, ip: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            ip: ip.into(),
            hostname: hostname.into(),
        }
    }
}

impl Mergeable for StaticLease {
    type Key = String;

    fn merge_key(&self) -> String {
        self.mac.to_lowercase()
    }

    fn same_content(&self, other: &Self) -> bool {
        self.ip == other.ip && self.hostname == other.hostname
    }
}

/// Response of the DHCP status endpoint
///
/// Dynamic leases are runtime state and not modelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DhcpStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v4: Option<DhcpV4Config>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v6: Option<DhcpV6Config>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub static_leases: Vec<StaticLease>,
}

impl DhcpStatus {
    /// Whether at least one address family is completely configured
    pub fn has_config(&self) -> bool {
        self.v4.as_ref().is_some_and(DhcpV4Config::is_valid)
            || self.v6.as_ref().is_some_and(DhcpV6Config::is_valid)
    }

    /// Server configuration with incomplete address families dropped
    pub fn server_config(&self) -> DhcpServerConfig {
        DhcpServerConfig {
            enabled: self.enabled,
            interface_name: self.interface_name.clone(),
            v4: self.v4.clone().filter(DhcpV4Config::is_valid),
            v6: self.v6.clone().filter(DhcpV6Config::is_valid),
        }
    }
}

/// Payload of the DHCP set-config endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v4: Option<DhcpV4Config>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v6: Option<DhcpV6Config>,
}

impl DhcpServerConfig {
    /// Apply a replica's interface name and enabled overrides
    pub fn with_overrides(mut self, interface_name: Option<&str>, enabled: Option<bool>) -> Self {
        if let Some(name) = interface_name.filter(|n| !n.is_empty()) {
            self.interface_name = Some(name.to_string());
        }
        if let Some(enabled) = enabled {
            self.enabled = Some(enabled);
        }
        self
    }

    pub fn matches(&self, other: &Self) -> bool {
        self == other
    }
}
