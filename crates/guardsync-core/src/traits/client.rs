// # Appliance Client Trait
//
// Defines the read/write contract the sync actions use against one
// appliance instance.
//
// ## Implementations
//
// - HTTP control API: `guardsync-client` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## Usage
//
// ```rust,ignore
// use guardsync_core::traits::ApplianceClient;
//
// async fn show(client: &dyn ApplianceClient) -> guardsync_core::Result<()> {
//     let status = client.status().await?;
//     println!("{} runs {}", client.host(), status.version);
//
//     for entry in client.rewrite_list().await? {
//         println!("{} -> {}", entry.domain, entry.answer);
//     }
//     Ok(())
// }
// ```

use crate::config::InstanceConfig;
use crate::error::Result;
use crate::model::{
    AccessList, BlockedServicesSchedule, Client, Clients, DhcpServerConfig, DhcpStatus, DnsConfig,
    Filter, FilterKind, FilterStatus, ProfileInfo, QueryLogConfig, RewriteEntry, SafeSearchConfig,
    ServerStatus, StaticLease, StatsConfig, TlsConfig,
};
use async_trait::async_trait;

/// Client for one appliance instance
///
/// One method per resource read or write. Each call is a single request;
/// implementations do not retry, cache, or decide whether a write is
/// needed. Those decisions belong to the sync actions.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Errors
///
/// - [`Error::SetupNeeded`](crate::Error::SetupNeeded) from
///   [`ApplianceClient::status`] when the instance has not been installed yet
/// - [`Error::Authentication`](crate::Error::Authentication) on rejected credentials
/// - [`Error::Api`](crate::Error::Api) for any other non-success response
#[async_trait]
pub trait ApplianceClient: Send + Sync {
    /// Host label used in logs and status
    fn host(&self) -> &str;

    /// Server status, including version and protection state
    async fn status(&self) -> Result<ServerStatus>;

    /// Run the initial setup with this client's credentials
    async fn setup(&self) -> Result<()>;

    /// Enable or disable DNS protection
    async fn toggle_protection(&self, enabled: bool) -> Result<()>;

    async fn profile_info(&self) -> Result<ProfileInfo>;
    async fn set_profile_info(&self, profile: &ProfileInfo) -> Result<()>;

    async fn parental(&self) -> Result<bool>;
    async fn toggle_parental(&self, enabled: bool) -> Result<()>;

    async fn safe_browsing(&self) -> Result<bool>;
    async fn toggle_safe_browsing(&self, enabled: bool) -> Result<()>;

    async fn safe_search_config(&self) -> Result<SafeSearchConfig>;
    async fn set_safe_search_config(&self, config: &SafeSearchConfig) -> Result<()>;

    async fn rewrite_list(&self) -> Result<Vec<RewriteEntry>>;
    async fn add_rewrite_entry(&self, entry: &RewriteEntry) -> Result<()>;
    async fn delete_rewrite_entry(&self, entry: &RewriteEntry) -> Result<()>;

    async fn filtering(&self) -> Result<FilterStatus>;
    async fn add_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()>;
    async fn update_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()>;
    async fn delete_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()>;
    /// Re-download every list of one collection
    async fn refresh_filters(&self, kind: FilterKind) -> Result<()>;
    /// Replace the custom filtering rules
    async fn set_custom_rules(&self, rules: &[String]) -> Result<()>;
    /// Set the global filtering switch and list update interval (hours)
    async fn toggle_filtering(&self, enabled: bool, interval: u32) -> Result<()>;

    async fn blocked_services_schedule(&self) -> Result<BlockedServicesSchedule>;
    async fn set_blocked_services_schedule(&self, schedule: &BlockedServicesSchedule) -> Result<()>;

    async fn clients(&self) -> Result<Clients>;
    async fn add_client(&self, client: &Client) -> Result<()>;
    async fn update_client(&self, client: &Client) -> Result<()>;
    async fn delete_client(&self, client: &Client) -> Result<()>;

    async fn query_log_config(&self) -> Result<QueryLogConfig>;
    async fn set_query_log_config(&self, config: &QueryLogConfig) -> Result<()>;

    async fn stats_config(&self) -> Result<StatsConfig>;
    async fn set_stats_config(&self, config: &StatsConfig) -> Result<()>;

    async fn access_list(&self) -> Result<AccessList>;
    async fn set_access_list(&self, list: &AccessList) -> Result<()>;

    async fn dns_config(&self) -> Result<DnsConfig>;
    async fn set_dns_config(&self, config: &DnsConfig) -> Result<()>;

    async fn dhcp_status(&self) -> Result<DhcpStatus>;
    async fn set_dhcp_config(&self, config: &DhcpServerConfig) -> Result<()>;
    async fn add_dhcp_static_lease(&self, lease: &StaticLease) -> Result<()>;
    async fn delete_dhcp_static_lease(&self, lease: &StaticLease) -> Result<()>;

    async fn tls_config(&self) -> Result<TlsConfig>;
    async fn set_tls_config(&self, config: &TlsConfig) -> Result<()>;
}

/// Helper trait for constructing clients from instance descriptors
pub trait ClientFactory: Send + Sync {
    /// Create a client for one instance
    ///
    /// # Returns
    ///
    /// A boxed ApplianceClient trait object, or a configuration error when
    /// the descriptor cannot be turned into a client
    fn create(&self, instance: &InstanceConfig) -> Result<Box<dyn ApplianceClient>>;
}
