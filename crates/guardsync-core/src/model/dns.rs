//! DNS server configuration and access lists

use super::{null_as_default, same_set};
use serde::{Deserialize, Serialize};

/// DNS server configuration (upstreams, cache, blocking behaviour)
///
/// `protection_enabled` is deliberately absent: protection is synced by the
/// general settings action from the server status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub upstream_dns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_dns_file: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bootstrap_dns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fallback_dns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_ptr_upstreams: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_private_ptr_resolvers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_clients: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratelimit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratelimit_subnet_len_ipv4: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratelimit_subnet_len_ipv6: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ratelimit_whitelist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_ipv6: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_response_ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edns_cs_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edns_cs_use_custom: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edns_cs_custom_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnssec_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_ipv6: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_optimistic: Option<bool>,
}

impl DnsConfig {
    /// Field-by-field equality; server lists compare as sets
    pub fn matches(&self, other: &Self) -> bool {
        same_set(&self.upstream_dns, &other.upstream_dns)
            && same_set(&self.bootstrap_dns, &other.bootstrap_dns)
            && same_set(&self.fallback_dns, &other.fallback_dns)
            && same_set(&self.local_ptr_upstreams, &other.local_ptr_upstreams)
            && same_set(&self.ratelimit_whitelist, &other.ratelimit_whitelist)
            && self.upstream_dns_file == other.upstream_dns_file
            && self.use_private_ptr_resolvers == other.use_private_ptr_resolvers
            && self.resolve_clients == other.resolve_clients
            && self.upstream_mode == other.upstream_mode
            && self.upstream_timeout == other.upstream_timeout
            && self.ratelimit == other.ratelimit
            && self.ratelimit_subnet_len_ipv4 == other.ratelimit_subnet_len_ipv4
            && self.ratelimit_subnet_len_ipv6 == other.ratelimit_subnet_len_ipv6
            && self.blocking_mode == other.blocking_mode
            && self.blocking_ipv4 == other.blocking_ipv4
            && self.blocking_ipv6 == other.blocking_ipv6
            && self.blocked_response_ttl == other.blocked_response_ttl
            && self.edns_cs_enabled == other.edns_cs_enabled
            && self.edns_cs_use_custom == other.edns_cs_use_custom
            && self.edns_cs_custom_ip == other.edns_cs_custom_ip
            && self.dnssec_enabled == other.dnssec_enabled
            && self.disable_ipv6 == other.disable_ipv6
            && self.cache_size == other.cache_size
            && self.cache_ttl_min == other.cache_ttl_min
            && self.cache_ttl_max == other.cache_ttl_max
            && self.cache_optimistic == other.cache_optimistic
    }

    /// Copy suitable for writing to a replica
    ///
    /// Private PTR resolution is turned off when no local PTR upstream is
    /// configured, a combination replicas reject.
    pub fn sanitized(&self) -> DnsConfig {
        let mut config = self.clone();
        if config.local_ptr_upstreams.is_empty() {
            config.use_private_ptr_resolvers = Some(false);
        }
        config
    }
}

/// Client access lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed_clients: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub disallowed_clients: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked_hosts: Vec<String>,
}

impl AccessList {
    pub fn matches(&self, other: &Self) -> bool {
        same_set(&self.allowed_clients, &other.allowed_clients)
            && same_set(&self.disallowed_clients, &other.disallowed_clients)
            && same_set(&self.blocked_hosts, &other.blocked_hosts)
    }
}
