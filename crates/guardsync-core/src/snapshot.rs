//! Origin snapshot
//!
//! The origin is read once per pass. Every replica is compared against the
//! same snapshot, which is never written back.

use crate::config::Features;
use crate::error::{Error, Result};
use crate::model::{
    AccessList, BlockedServicesSchedule, Clients, DhcpStatus, DnsConfig, FilterStatus,
    ProfileInfo, QueryLogConfig, RewriteEntry, SafeSearchConfig, ServerStatus, StatsConfig,
    TlsConfig,
};
use crate::traits::ApplianceClient;
use tracing::debug;

/// Resources read from the origin, one field per enabled resource type
#[derive(Debug, Clone, Default)]
pub struct OriginSnapshot {
    pub status: ServerStatus,
    pub profile: Option<ProfileInfo>,
    pub parental: Option<bool>,
    pub safe_search: Option<SafeSearchConfig>,
    pub safe_browsing: Option<bool>,
    pub dns_config: Option<DnsConfig>,
    pub query_log_config: Option<QueryLogConfig>,
    pub stats_config: Option<StatsConfig>,
    pub rewrites: Option<Vec<RewriteEntry>>,
    pub filters: Option<FilterStatus>,
    pub blocked_services_schedule: Option<BlockedServicesSchedule>,
    pub clients: Option<Clients>,
    pub access_list: Option<AccessList>,
    pub dhcp: Option<DhcpStatus>,
    pub tls_config: Option<TlsConfig>,
}

impl OriginSnapshot {
    /// Read every enabled resource type from the origin
    ///
    /// `status` is the origin status already read for the version check.
    /// Any failed read fails the whole snapshot.
    pub async fn fetch(
        client: &dyn ApplianceClient,
        status: ServerStatus,
        features: &Features,
    ) -> Result<Self> {
        let mut snapshot = OriginSnapshot {
            status,
            ..Default::default()
        };

        if features.general_settings {
            snapshot.profile = Some(client.profile_info().await?);
            snapshot.parental = Some(client.parental().await?);
            snapshot.safe_search = Some(client.safe_search_config().await?);
            snapshot.safe_browsing = Some(client.safe_browsing().await?);
        }
        if features.dns.server_config {
            snapshot.dns_config = Some(client.dns_config().await?);
        }
        if features.query_log_config {
            snapshot.query_log_config = Some(client.query_log_config().await?);
        }
        if features.stats_config {
            snapshot.stats_config = Some(client.stats_config().await?);
        }
        if features.dns.rewrites {
            snapshot.rewrites = Some(client.rewrite_list().await?);
        }
        if features.filters {
            snapshot.filters = Some(client.filtering().await?);
        }
        if features.services {
            snapshot.blocked_services_schedule = Some(client.blocked_services_schedule().await?);
        }
        if features.client_settings {
            snapshot.clients = Some(client.clients().await?);
        }
        if features.dns.access_lists {
            snapshot.access_list = Some(client.access_list().await?);
        }
        if features.dhcp.server_config || features.dhcp.static_leases {
            snapshot.dhcp = Some(client.dhcp_status().await?);
        }
        if features.tls_config {
            snapshot.tls_config = Some(client.tls_config().await?);
        }

        debug!("Origin snapshot of {} fetched", client.host());
        Ok(snapshot)
    }
}

/// Borrow a snapshot field an action depends on
pub(crate) fn required<'a, T>(field: &'a Option<T>, what: &'static str) -> Result<&'a T> {
    field.as_ref().ok_or(Error::MissingSnapshot(what))
}
