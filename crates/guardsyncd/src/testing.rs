//! Test doubles shared by the daemon's unit tests

use async_trait::async_trait;
use guardsync_core::config::{InstanceConfig, SyncConfig};
use guardsync_core::model::*;
use guardsync_core::traits::{ApplianceClient, ClientFactory};
use guardsync_core::{Error, Result, SyncEngine};
use std::sync::Arc;
use tokio::sync::Notify;

/// An instance where every resource is empty and every write succeeds
pub struct EmptyAppliance {
    host: String,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl ApplianceClient for EmptyAppliance {
    fn host(&self) -> &str {
        &self.host
    }
    async fn status(&self) -> Result<ServerStatus> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(ServerStatus {
            version: "v0.107.52".to_string(),
            ..Default::default()
        })
    }
    async fn setup(&self) -> Result<()> {
        Ok(())
    }
    async fn toggle_protection(&self, _: bool) -> Result<()> {
        Ok(())
    }
    async fn profile_info(&self) -> Result<ProfileInfo> {
        Ok(ProfileInfo::default())
    }
    async fn set_profile_info(&self, _: &ProfileInfo) -> Result<()> {
        Ok(())
    }
    async fn parental(&self) -> Result<bool> {
        Ok(false)
    }
    async fn toggle_parental(&self, _: bool) -> Result<()> {
        Ok(())
    }
    async fn safe_browsing(&self) -> Result<bool> {
        Ok(false)
    }
    async fn toggle_safe_browsing(&self, _: bool) -> Result<()> {
        Ok(())
    }
    async fn safe_search_config(&self) -> Result<SafeSearchConfig> {
        Ok(SafeSearchConfig::default())
    }
    async fn set_safe_search_config(&self, _: &SafeSearchConfig) -> Result<()> {
        Ok(())
    }
    async fn rewrite_list(&self) -> Result<Vec<RewriteEntry>> {
        Ok(Vec::new())
    }
    async fn add_rewrite_entry(&self, _: &RewriteEntry) -> Result<()> {
        Ok(())
    }
    async fn delete_rewrite_entry(&self, _: &RewriteEntry) -> Result<()> {
        Ok(())
    }
    async fn filtering(&self) -> Result<FilterStatus> {
        Ok(FilterStatus::default())
    }
    async fn add_filter(&self, _: FilterKind, _: &Filter) -> Result<()> {
        Ok(())
    }
    async fn update_filter(&self, _: FilterKind, _: &Filter) -> Result<()> {
        Ok(())
    }
    async fn delete_filter(&self, _: FilterKind, _: &Filter) -> Result<()> {
        Ok(())
    }
    async fn refresh_filters(&self, _: FilterKind) -> Result<()> {
        Ok(())
    }
    async fn set_custom_rules(&self, _: &[String]) -> Result<()> {
        Ok(())
    }
    async fn toggle_filtering(&self, _: bool, _: u32) -> Result<()> {
        Ok(())
    }
    async fn blocked_services_schedule(&self) -> Result<BlockedServicesSchedule> {
        Ok(BlockedServicesSchedule::default())
    }
    async fn set_blocked_services_schedule(&self, _: &BlockedServicesSchedule) -> Result<()> {
        Ok(())
    }
    async fn clients(&self) -> Result<Clients> {
        Ok(Clients::default())
    }
    async fn add_client(&self, _: &Client) -> Result<()> {
        Ok(())
    }
    async fn update_client(&self, _: &Client) -> Result<()> {
        Ok(())
    }
    async fn delete_client(&self, _: &Client) -> Result<()> {
        Ok(())
    }
    async fn query_log_config(&self) -> Result<QueryLogConfig> {
        Ok(QueryLogConfig::default())
    }
    async fn set_query_log_config(&self, _: &QueryLogConfig) -> Result<()> {
        Ok(())
    }
    async fn stats_config(&self) -> Result<StatsConfig> {
        Ok(StatsConfig::default())
    }
    async fn set_stats_config(&self, _: &StatsConfig) -> Result<()> {
        Ok(())
    }
    async fn access_list(&self) -> Result<AccessList> {
        Ok(AccessList::default())
    }
    async fn set_access_list(&self, _: &AccessList) -> Result<()> {
        Ok(())
    }
    async fn dns_config(&self) -> Result<DnsConfig> {
        Ok(DnsConfig::default().sanitized())
    }
    async fn set_dns_config(&self, _: &DnsConfig) -> Result<()> {
        Ok(())
    }
    async fn dhcp_status(&self) -> Result<DhcpStatus> {
        Ok(DhcpStatus::default())
    }
    async fn set_dhcp_config(&self, _: &DhcpServerConfig) -> Result<()> {
        Ok(())
    }
    async fn add_dhcp_static_lease(&self, _: &StaticLease) -> Result<()> {
        Ok(())
    }
    async fn delete_dhcp_static_lease(&self, _: &StaticLease) -> Result<()> {
        Ok(())
    }
    async fn tls_config(&self) -> Result<TlsConfig> {
        Ok(TlsConfig::default())
    }
    async fn set_tls_config(&self, _: &TlsConfig) -> Result<()> {
        Ok(())
    }
}

/// Every URL except `unreachable` gets an empty appliance; the origin
/// holds status() until `gate` is notified, when set
#[derive(Default)]
pub struct EmptyFactory {
    pub gate: Option<Arc<Notify>>,
}

impl ClientFactory for EmptyFactory {
    fn create(&self, instance: &InstanceConfig) -> Result<Box<dyn ApplianceClient>> {
        if instance.url.contains("unreachable") {
            return Err(Error::http("connection refused"));
        }
        let gate = self.gate.clone().filter(|_| instance.url.contains("origin"));
        Ok(Box::new(EmptyAppliance {
            host: instance.host().to_string(),
            gate,
        }))
    }
}

pub fn engine_with(origin: &str, factory: EmptyFactory) -> Arc<SyncEngine> {
    let config = SyncConfig::new(
        InstanceConfig::new(origin),
        vec![InstanceConfig::new("http://replica:3000")],
    );
    let (engine, _events) = SyncEngine::new(config, Arc::new(factory)).unwrap();
    Arc::new(engine)
}

pub fn engine(origin: &str) -> Arc<SyncEngine> {
    engine_with(origin, EmptyFactory::default())
}
