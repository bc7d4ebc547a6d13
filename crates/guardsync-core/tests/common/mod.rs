//! Test doubles and common utilities for sync contract tests
//!
//! [`MockAppliance`] keeps an in-memory appliance state, applies writes to
//! it, and records every call so tests can assert exactly which writes a
//! pass issued.

#![allow(dead_code)]

use async_trait::async_trait;
use guardsync_core::config::{InstanceConfig, SyncConfig};
use guardsync_core::error::{Error, Result};
use guardsync_core::model::{
    AccessList, BlockedServicesSchedule, Client, Clients, DhcpServerConfig, DhcpStatus, DnsConfig,
    Filter, FilterKind, FilterStatus, ProfileInfo, QueryLogConfig, RewriteEntry,
    SafeSearchConfig, ServerStatus, StaticLease, StatsConfig, TlsConfig,
};
use guardsync_core::traits::{ApplianceClient, ClientFactory};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const VERSION: &str = "v0.107.52";

/// Everything a mock appliance stores
#[derive(Debug, Clone, Default)]
pub struct ApplianceState {
    pub status: ServerStatus,
    pub setup_needed: bool,
    pub profile: ProfileInfo,
    pub parental: bool,
    pub safe_browsing: bool,
    pub safe_search: SafeSearchConfig,
    pub rewrites: Vec<RewriteEntry>,
    pub filtering: FilterStatus,
    pub blocked_services: BlockedServicesSchedule,
    pub clients: Clients,
    pub query_log: QueryLogConfig,
    pub stats: StatsConfig,
    pub access_list: AccessList,
    pub dns: DnsConfig,
    pub dhcp: DhcpStatus,
    pub tls: TlsConfig,
}

impl ApplianceState {
    /// A freshly installed appliance running [`VERSION`]
    pub fn new() -> Self {
        Self {
            status: ServerStatus {
                version: VERSION.to_string(),
                language: "en".to_string(),
                protection_enabled: true,
                running: true,
                ..Default::default()
            },
            profile: ProfileInfo {
                name: "admin".to_string(),
                language: "en".to_string(),
                theme: "auto".to_string(),
            },
            ..Default::default()
        }
    }
}

/// A mock appliance that applies writes to its state and records calls
#[derive(Clone)]
pub struct MockAppliance {
    host: String,
    state: Arc<Mutex<ApplianceState>>,
    reads: Arc<Mutex<Vec<String>>>,
    writes: Arc<Mutex<Vec<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    /// When set, status() waits for a notification before answering
    gate: Option<Arc<Notify>>,
}

impl MockAppliance {
    pub fn new(host: &str, state: ApplianceState) -> Self {
        Self {
            host: host.to_string(),
            state: Arc::new(Mutex::new(state)),
            reads: Arc::new(Mutex::new(Vec::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            gate: None,
        }
    }

    /// Hold status() until the returned handle is notified
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Make the call with this label fail, e.g. `delete_client:tv`
    pub fn fail_on(&self, label: &str) {
        self.failing.lock().unwrap().insert(label.to_string());
    }

    pub fn state(&self) -> ApplianceState {
        self.state.lock().unwrap().clone()
    }

    pub fn update_state(&self, f: impl FnOnce(&mut ApplianceState)) {
        f(&mut self.state.lock().unwrap());
    }

    /// Every write call, in order
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// Every read call, in order
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    /// Number of writes whose label starts with `prefix`
    pub fn write_count(&self, prefix: &str) -> usize {
        self.writes().iter().filter(|w| w.starts_with(prefix)).count()
    }

    pub fn read_count(&self, label: &str) -> usize {
        self.reads().iter().filter(|r| r.as_str() == label).count()
    }

    pub fn clear_calls(&self) {
        self.reads.lock().unwrap().clear();
        self.writes.lock().unwrap().clear();
    }

    fn read(&self, label: &str) -> Result<ApplianceState> {
        self.reads.lock().unwrap().push(label.to_string());
        if self.failing.lock().unwrap().contains(label) {
            return Err(Error::http(format!("{label} failed")));
        }
        Ok(self.state())
    }

    fn write(&self, label: String, apply: impl FnOnce(&mut ApplianceState)) -> Result<()> {
        self.writes.lock().unwrap().push(label.clone());
        if self.failing.lock().unwrap().contains(&label) {
            return Err(Error::api(500, format!("{label} failed")));
        }
        apply(&mut self.state.lock().unwrap());
        Ok(())
    }
}

fn list_mut(filtering: &mut FilterStatus, kind: FilterKind) -> &mut Vec<Filter> {
    match kind {
        FilterKind::Blocklist => &mut filtering.filters,
        FilterKind::Allowlist => &mut filtering.whitelist_filters,
    }
}

#[async_trait]
impl ApplianceClient for MockAppliance {
    fn host(&self) -> &str {
        &self.host
    }

    async fn status(&self) -> Result<ServerStatus> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let state = self.read("status")?;
        if state.setup_needed {
            return Err(Error::SetupNeeded);
        }
        Ok(state.status)
    }

    async fn setup(&self) -> Result<()> {
        self.write("setup".to_string(), |s| s.setup_needed = false)
    }

    async fn toggle_protection(&self, enabled: bool) -> Result<()> {
        self.write(format!("toggle_protection:{enabled}"), |s| {
            s.status.protection_enabled = enabled
        })
    }

    async fn profile_info(&self) -> Result<ProfileInfo> {
        Ok(self.read("profile_info")?.profile)
    }

    async fn set_profile_info(&self, profile: &ProfileInfo) -> Result<()> {
        self.write("set_profile_info".to_string(), |s| s.profile = profile.clone())
    }

    async fn parental(&self) -> Result<bool> {
        Ok(self.read("parental")?.parental)
    }

    async fn toggle_parental(&self, enabled: bool) -> Result<()> {
        self.write(format!("toggle_parental:{enabled}"), |s| s.parental = enabled)
    }

    async fn safe_browsing(&self) -> Result<bool> {
        Ok(self.read("safe_browsing")?.safe_browsing)
    }

    async fn toggle_safe_browsing(&self, enabled: bool) -> Result<()> {
        self.write(format!("toggle_safe_browsing:{enabled}"), |s| {
            s.safe_browsing = enabled
        })
    }

    async fn safe_search_config(&self) -> Result<SafeSearchConfig> {
        Ok(self.read("safe_search_config")?.safe_search)
    }

    async fn set_safe_search_config(&self, config: &SafeSearchConfig) -> Result<()> {
        self.write("set_safe_search_config".to_string(), |s| {
            s.safe_search = config.clone()
        })
    }

    async fn rewrite_list(&self) -> Result<Vec<RewriteEntry>> {
        Ok(self.read("rewrite_list")?.rewrites)
    }

    async fn add_rewrite_entry(&self, entry: &RewriteEntry) -> Result<()> {
        self.write(format!("add_rewrite:{}", entry.key()), |s| {
            s.rewrites.push(entry.clone())
        })
    }

    async fn delete_rewrite_entry(&self, entry: &RewriteEntry) -> Result<()> {
        self.write(format!("delete_rewrite:{}", entry.key()), |s| {
            if let Some(pos) = s.rewrites.iter().position(|e| e == entry) {
                s.rewrites.remove(pos);
            }
        })
    }

    async fn filtering(&self) -> Result<FilterStatus> {
        Ok(self.read("filtering")?.filtering)
    }

    async fn add_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()> {
        self.write(format!("add_filter:{kind}:{}", filter.url), |s| {
            list_mut(&mut s.filtering, kind).push(filter.clone())
        })
    }

    async fn update_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()> {
        self.write(format!("update_filter:{kind}:{}", filter.url), |s| {
            if let Some(existing) = list_mut(&mut s.filtering, kind)
                .iter_mut()
                .find(|f| f.url == filter.url)
            {
                existing.name = filter.name.clone();
                existing.enabled = filter.enabled;
            }
        })
    }

    async fn delete_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()> {
        self.write(format!("delete_filter:{kind}:{}", filter.url), |s| {
            list_mut(&mut s.filtering, kind).retain(|f| f.url != filter.url)
        })
    }

    async fn refresh_filters(&self, kind: FilterKind) -> Result<()> {
        self.write(format!("refresh_filters:{kind}"), |_| {})
    }

    async fn set_custom_rules(&self, rules: &[String]) -> Result<()> {
        self.write("set_custom_rules".to_string(), |s| {
            s.filtering.user_rules = rules.to_vec()
        })
    }

    async fn toggle_filtering(&self, enabled: bool, interval: u32) -> Result<()> {
        self.write(format!("toggle_filtering:{enabled}:{interval}"), |s| {
            s.filtering.enabled = enabled;
            s.filtering.interval = interval;
        })
    }

    async fn blocked_services_schedule(&self) -> Result<BlockedServicesSchedule> {
        Ok(self.read("blocked_services_schedule")?.blocked_services)
    }

    async fn set_blocked_services_schedule(&self, schedule: &BlockedServicesSchedule) -> Result<()> {
        self.write("set_blocked_services_schedule".to_string(), |s| {
            s.blocked_services = schedule.clone()
        })
    }

    async fn clients(&self) -> Result<Clients> {
        Ok(self.read("clients")?.clients)
    }

    async fn add_client(&self, client: &Client) -> Result<()> {
        self.write(format!("add_client:{}", client.name), |s| {
            s.clients.clients.push(client.clone())
        })
    }

    async fn update_client(&self, client: &Client) -> Result<()> {
        self.write(format!("update_client:{}", client.name), |s| {
            if let Some(existing) = s.clients.clients.iter_mut().find(|c| c.name == client.name) {
                *existing = client.clone();
            }
        })
    }

    async fn delete_client(&self, client: &Client) -> Result<()> {
        self.write(format!("delete_client:{}", client.name), |s| {
            s.clients.clients.retain(|c| c.name != client.name)
        })
    }

    async fn query_log_config(&self) -> Result<QueryLogConfig> {
        Ok(self.read("query_log_config")?.query_log)
    }

    async fn set_query_log_config(&self, config: &QueryLogConfig) -> Result<()> {
        self.write("set_query_log_config".to_string(), |s| {
            s.query_log = config.clone()
        })
    }

    async fn stats_config(&self) -> Result<StatsConfig> {
        Ok(self.read("stats_config")?.stats)
    }

    async fn set_stats_config(&self, config: &StatsConfig) -> Result<()> {
        self.write("set_stats_config".to_string(), |s| s.stats = config.clone())
    }

    async fn access_list(&self) -> Result<AccessList> {
        Ok(self.read("access_list")?.access_list)
    }

    async fn set_access_list(&self, list: &AccessList) -> Result<()> {
        self.write("set_access_list".to_string(), |s| s.access_list = list.clone())
    }

    async fn dns_config(&self) -> Result<DnsConfig> {
        Ok(self.read("dns_config")?.dns)
    }

    async fn set_dns_config(&self, config: &DnsConfig) -> Result<()> {
        self.write("set_dns_config".to_string(), |s| s.dns = config.clone())
    }

    async fn dhcp_status(&self) -> Result<DhcpStatus> {
        Ok(self.read("dhcp_status")?.dhcp)
    }

    async fn set_dhcp_config(&self, config: &DhcpServerConfig) -> Result<()> {
        self.write("set_dhcp_config".to_string(), |s| {
            s.dhcp.enabled = config.enabled;
            s.dhcp.interface_name = config.interface_name.clone();
            s.dhcp.v4 = config.v4.clone();
            s.dhcp.v6 = config.v6.clone();
        })
    }

    async fn add_dhcp_static_lease(&self, lease: &StaticLease) -> Result<()> {
        self.write(format!("add_static_lease:{}", lease.mac), |s| {
            s.dhcp.static_leases.push(lease.clone())
        })
    }

    async fn delete_dhcp_static_lease(&self, lease: &StaticLease) -> Result<()> {
        self.write(format!("delete_static_lease:{}", lease.mac), |s| {
            if let Some(pos) = s.dhcp.static_leases.iter().position(|l| l == lease) {
                s.dhcp.static_leases.remove(pos);
            }
        })
    }

    async fn tls_config(&self) -> Result<TlsConfig> {
        Ok(self.read("tls_config")?.tls)
    }

    async fn set_tls_config(&self, config: &TlsConfig) -> Result<()> {
        self.write("set_tls_config".to_string(), |s| s.tls = config.clone())
    }
}

/// Factory handing out mocks by instance URL
///
/// URLs without a registered mock fail like an unreachable instance.
#[derive(Clone, Default)]
pub struct MockFactory {
    appliances: Arc<Mutex<HashMap<String, MockAppliance>>>,
    create_count: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, url: &str, appliance: &MockAppliance) {
        self.appliances
            .lock()
            .unwrap()
            .insert(url.to_string(), appliance.clone());
    }

    /// Register an appliance for one URL and API path only
    pub fn register_instance(&self, instance: &InstanceConfig, appliance: &MockAppliance) {
        self.appliances
            .lock()
            .unwrap()
            .insert(instance.key(), appliance.clone());
    }

    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockFactory {
    fn create(&self, instance: &InstanceConfig) -> Result<Box<dyn ApplianceClient>> {
        self.create_count.fetch_add(1, Ordering::SeqCst);
        let appliances = self.appliances.lock().unwrap();
        appliances
            .get(&instance.key())
            .or_else(|| appliances.get(&instance.url))
            .cloned()
            .map(|a| Box::new(a) as Box<dyn ApplianceClient>)
            .ok_or_else(|| Error::http(format!("connection refused: {}", instance.url)))
    }
}

pub const ORIGIN_URL: &str = "http://origin:3000";

pub fn replica_url(n: usize) -> String {
    format!("http://replica{n}:3000")
}

/// Config for the origin and `replicas` replicas with default features
pub fn sync_config(replicas: usize) -> SyncConfig {
    SyncConfig::new(
        InstanceConfig::new(ORIGIN_URL),
        (1..=replicas)
            .map(|n| InstanceConfig::new(replica_url(n)))
            .collect(),
    )
}

/// Origin plus `replicas` replicas, all registered with a fresh factory
pub fn setup(
    origin: ApplianceState,
    replicas: usize,
) -> (MockFactory, MockAppliance, Vec<MockAppliance>) {
    let factory = MockFactory::new();
    let origin = MockAppliance::new("origin:3000", origin);
    factory.register(ORIGIN_URL, &origin);

    let replicas: Vec<MockAppliance> = (1..=replicas)
        .map(|n| {
            let replica = MockAppliance::new(&format!("replica{n}:3000"), ApplianceState::new());
            factory.register(&replica_url(n), &replica);
            replica
        })
        .collect();

    (factory, origin, replicas)
}

/// An origin with something to sync for every resource type
pub fn populated_origin() -> ApplianceState {
    let mut state = ApplianceState::new();
    state.status.protection_enabled = false;
    state.profile.language = "de".to_string();
    state.profile.theme = "dark".to_string();
    state.parental = true;
    state.safe_browsing = true;
    state.safe_search = SafeSearchConfig {
        enabled: Some(true),
        google: Some(true),
        ..Default::default()
    };
    state.rewrites = vec![
        RewriteEntry::new("nas.lan", "192.168.1.10"),
        RewriteEntry::new("*.lab.lan", "192.168.1.20"),
    ];
    state.filtering = FilterStatus {
        enabled: true,
        interval: 24,
        filters: vec![Filter::new("https://lists.example/ads.txt", "Ads", true)],
        whitelist_filters: vec![Filter::new("https://lists.example/allow.txt", "Allow", true)],
        user_rules: vec!["||tracker.example^".to_string()],
    };
    state.blocked_services = BlockedServicesSchedule {
        ids: vec!["tiktok".to_string()],
        schedule: None,
    };
    state.clients = Clients {
        clients: vec![Client {
            ids: vec!["192.168.1.50".to_string()],
            tags: vec!["device_tv".to_string()],
            filtering_enabled: Some(true),
            ..Client::new("tv")
        }],
        supported_tags: vec![],
    };
    state.query_log = QueryLogConfig {
        enabled: Some(true),
        interval: Some(7_776_000_000),
        anonymize_client_ip: Some(false),
        ..Default::default()
    };
    state.stats = StatsConfig {
        enabled: Some(true),
        interval: Some(86_400_000),
        ..Default::default()
    };
    state.access_list = AccessList {
        disallowed_clients: vec!["192.168.1.66".to_string()],
        ..Default::default()
    };
    state.dns = DnsConfig {
        upstream_dns: vec!["https://dns.quad9.net/dns-query".to_string()],
        cache_size: Some(4_194_304),
        ..Default::default()
    };
    state.dhcp = DhcpStatus {
        enabled: Some(true),
        interface_name: Some("eth0".to_string()),
        v4: Some(guardsync_core::model::DhcpV4Config {
            gateway_ip: Some("192.168.1.1".to_string()),
            subnet_mask: Some("255.255.255.0".to_string()),
            range_start: Some("192.168.1.100".to_string()),
            range_end: Some("192.168.1.200".to_string()),
            lease_duration: Some(86_400),
        }),
        v6: None,
        static_leases: vec![StaticLease::new("aa:bb:cc:dd:ee:01", "192.168.1.10", "nas")],
    };
    state.tls = TlsConfig {
        enabled: Some(false),
        server_name: Some("dns.example.com".to_string()),
        ..Default::default()
    };
    state
}
