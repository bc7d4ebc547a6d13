//! Feature-gated action registry
//!
//! Maps the configured [`Features`] to the ordered list of sync actions run
//! against every replica. The order is fixed: general settings first, then
//! DNS server config, query log and statistics config, rewrites, filters,
//! blocked services, clients, access lists, DHCP and finally TLS.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use guardsync_core::config::Features;
//! use guardsync_core::registry::build_actions;
//!
//! let mut features = Features::default();
//! features.filters = false;
//!
//! for action in build_actions(&features) {
//!     println!("{action}");
//! }
//! ```
//!
//! The list is built once per pass and shared by every replica.

use crate::config::Features;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One resource-type synchronization step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Profile and theme, protection, parental control, safe search, safe browsing
    GeneralSettings,
    DnsServerConfig,
    QueryLogConfig,
    StatsConfig,
    DnsRewrites,
    Filters,
    BlockedServicesSchedule,
    ClientSettings,
    DnsAccessLists,
    DhcpServerConfig,
    DhcpStaticLeases,
    TlsConfig,
}

impl SyncAction {
    /// Every action in execution order
    pub const ALL: [SyncAction; 12] = [
        SyncAction::GeneralSettings,
        SyncAction::DnsServerConfig,
        SyncAction::QueryLogConfig,
        SyncAction::StatsConfig,
        SyncAction::DnsRewrites,
        SyncAction::Filters,
        SyncAction::BlockedServicesSchedule,
        SyncAction::ClientSettings,
        SyncAction::DnsAccessLists,
        SyncAction::DhcpServerConfig,
        SyncAction::DhcpStaticLeases,
        SyncAction::TlsConfig,
    ];

    /// Stable name used in logs and serialized reports
    pub fn name(self) -> &'static str {
        match self {
            Self::GeneralSettings => "general_settings",
            Self::DnsServerConfig => "dns_server_config",
            Self::QueryLogConfig => "query_log_config",
            Self::StatsConfig => "stats_config",
            Self::DnsRewrites => "dns_rewrites",
            Self::Filters => "filters",
            Self::BlockedServicesSchedule => "blocked_services_schedule",
            Self::ClientSettings => "client_settings",
            Self::DnsAccessLists => "dns_access_lists",
            Self::DhcpServerConfig => "dhcp_server_config",
            Self::DhcpStaticLeases => "dhcp_static_leases",
            Self::TlsConfig => "tls_config",
        }
    }

    /// Whether the feature flag for this action is on
    pub fn is_enabled(self, features: &Features) -> bool {
        match self {
            Self::GeneralSettings => features.general_settings,
            Self::DnsServerConfig => features.dns.server_config,
            Self::QueryLogConfig => features.query_log_config,
            Self::StatsConfig => features.stats_config,
            Self::DnsRewrites => features.dns.rewrites,
            Self::Filters => features.filters,
            Self::BlockedServicesSchedule => features.services,
            Self::ClientSettings => features.client_settings,
            Self::DnsAccessLists => features.dns.access_lists,
            Self::DhcpServerConfig => features.dhcp.server_config,
            Self::DhcpStaticLeases => features.dhcp.static_leases,
            Self::TlsConfig => features.tls_config,
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered actions for a feature set
pub fn build_actions(features: &Features) -> Vec<SyncAction> {
    SyncAction::ALL
        .into_iter()
        .filter(|action| action.is_enabled(features))
        .collect()
}
