//! Configuration types for the guardsync system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Default control API path on an instance
pub const DEFAULT_API_PATH: &str = "/control";

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// The instance every replica is driven to match
    pub origin: InstanceConfig,

    /// Instances that receive the origin's configuration
    pub replicas: Vec<InstanceConfig>,

    /// Keep going after a failed item write instead of aborting the action
    #[serde(default)]
    pub continue_on_error: bool,

    /// Resource types to synchronize
    #[serde(default)]
    pub features: Features,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a configuration for one origin and its replicas with defaults
    pub fn new(origin: InstanceConfig, replicas: Vec<InstanceConfig>) -> Self {
        Self {
            origin,
            replicas,
            continue_on_error: false,
            features: Features::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.origin.validate()?;

        let replicas = self.unique_replicas();
        if replicas.is_empty() {
            return Err(crate::Error::config("No replicas configured"));
        }

        for replica in &replicas {
            replica.validate()?;
        }

        let origin_key = self.origin.key();
        if replicas.iter().any(|r| r.key() == origin_key) {
            return Err(crate::Error::config(format!(
                "Origin {} is also configured as a replica",
                self.origin.url
            )));
        }

        if self.engine.event_channel_capacity == 0 {
            return Err(crate::Error::config(
                "event_channel_capacity must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Replicas de-duplicated by instance key and sorted by it
    ///
    /// Entries without a URL are skipped and an empty API path falls back
    /// to [`DEFAULT_API_PATH`]. The first descriptor for a key wins.
    pub fn unique_replicas(&self) -> Vec<InstanceConfig> {
        let mut seen = HashSet::new();
        let mut unique: Vec<InstanceConfig> = self
            .replicas
            .iter()
            .filter(|r| !r.url.is_empty())
            .map(|r| {
                let mut r = r.clone();
                if r.api_path.is_empty() {
                    r.api_path = DEFAULT_API_PATH.to_string();
                }
                r
            })
            .filter(|r| seen.insert(r.key()))
            .collect();

        unique.sort_by_key(|r| r.key());
        unique
    }
}

/// Descriptor for one appliance instance
#[derive(Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Base URL of the control API, e.g. `http://192.168.1.2:3000`
    pub url: String,

    /// URL of the web interface, when different from `url`
    #[serde(default)]
    pub web_url: Option<String>,

    /// Path of the control API below `url`
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Basic auth username
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub password: Option<String>,

    /// Session cookie as `name=value`, used when no credentials are set
    #[serde(default)]
    pub cookie: Option<String>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// Run the initial setup when the instance reports it is unconfigured
    #[serde(default)]
    pub auto_setup: bool,

    /// Interface name written to this replica's DHCP config instead of the origin's
    #[serde(default)]
    pub interface_name: Option<String>,

    /// DHCP enabled flag written to this replica instead of the origin's
    #[serde(default)]
    pub dhcp_server_enabled: Option<bool>,
}

// Custom Debug implementation that masks credentials
impl std::fmt::Debug for InstanceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceConfig")
            .field("url", &self.url)
            .field("web_url", &self.web_url)
            .field("api_path", &self.api_path)
            .field("username", &self.username.as_deref().map(mask))
            .field("password", &self.password.as_deref().map(mask))
            .field("cookie", &self.cookie.as_ref().map(|_| "<REDACTED>"))
            .field("request_headers", &self.request_headers.keys().collect::<Vec<_>>())
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("auto_setup", &self.auto_setup)
            .field("interface_name", &self.interface_name)
            .field("dhcp_server_enabled", &self.dhcp_server_enabled)
            .finish()
    }
}

impl InstanceConfig {
    /// Create a descriptor for a URL with default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            web_url: None,
            api_path: default_api_path(),
            username: None,
            password: None,
            cookie: None,
            request_headers: BTreeMap::new(),
            insecure_skip_verify: false,
            auto_setup: false,
            interface_name: None,
            dhcp_server_enabled: None,
        }
    }

    /// Set basic auth credentials
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the control API path
    pub fn with_api_path(mut self, api_path: impl Into<String>) -> Self {
        self.api_path = api_path.into();
        self
    }

    /// Enable or disable auto setup
    pub fn with_auto_setup(mut self, auto_setup: bool) -> Self {
        self.auto_setup = auto_setup;
        self
    }

    /// Unique key of this instance: URL and API path
    pub fn key(&self) -> String {
        format!("{}#{}", self.url, self.api_path)
    }

    /// Host (and port) part of the URL, used to label logs and status
    pub fn host(&self) -> &str {
        host_of(&self.url)
    }

    /// Host of the web interface, falling back to [`InstanceConfig::host`]
    pub fn web_host(&self) -> &str {
        match self.web_url.as_deref() {
            Some(web) if !web.is_empty() => host_of(web),
            _ => self.host(),
        }
    }

    /// Validate the descriptor
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("Instance URL cannot be empty"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(crate::Error::config(format!(
                "Instance URL must use http or https: {}",
                self.url
            )));
        }
        if self.host().is_empty() {
            return Err(crate::Error::config(format!(
                "Instance URL has no host: {}",
                self.url
            )));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(crate::Error::config(format!(
                "Instance {} needs both username and password or neither",
                self.host()
            )));
        }
        if let Some(cookie) = &self.cookie
            && !cookie.contains('=')
        {
            return Err(crate::Error::config(format!(
                "Instance {} cookie must be name=value",
                self.host()
            )));
        }
        Ok(())
    }
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?', '#']).next().unwrap_or_default()
}

/// Mask a credential for display, keeping the first and last character
pub fn mask(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 3 {
        return "*".repeat(chars.len());
    }
    format!(
        "{}{}{}",
        chars[0],
        "*".repeat(chars.len() - 2),
        chars[chars.len() - 1]
    )
}

/// Resource types to synchronize
///
/// Every flag except `theme` enables exactly one sync action. `theme`
/// controls whether the UI theme is part of the profile comparison done
/// by the general settings action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    /// Profile, protection, parental control, safe search and safe browsing
    #[serde(default = "default_enabled")]
    pub general_settings: bool,

    /// Query log configuration
    #[serde(default = "default_enabled")]
    pub query_log_config: bool,

    /// Statistics configuration
    #[serde(default = "default_enabled")]
    pub stats_config: bool,

    /// Persistent client settings
    #[serde(default = "default_enabled")]
    pub client_settings: bool,

    /// Blocked services schedule
    #[serde(default = "default_enabled")]
    pub services: bool,

    /// Filter lists, custom rules and filtering toggle
    #[serde(default = "default_enabled")]
    pub filters: bool,

    /// Include the UI theme in profile sync
    #[serde(default = "default_enabled")]
    pub theme: bool,

    /// TLS configuration
    #[serde(default = "default_enabled")]
    pub tls_config: bool,

    /// DNS features
    #[serde(default)]
    pub dns: DnsFeatures,

    /// DHCP features
    #[serde(default)]
    pub dhcp: DhcpFeatures,
}

/// DNS feature flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsFeatures {
    /// Allowed/disallowed clients and blocked hosts
    #[serde(default = "default_enabled")]
    pub access_lists: bool,

    /// Upstream, cache and blocking settings
    #[serde(default = "default_enabled")]
    pub server_config: bool,

    /// DNS rewrites
    #[serde(default = "default_enabled")]
    pub rewrites: bool,
}

/// DHCP feature flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpFeatures {
    /// DHCP server configuration
    #[serde(default = "default_enabled")]
    pub server_config: bool,

    /// DHCP static leases
    #[serde(default = "default_enabled")]
    pub static_leases: bool,
}

impl Features {
    /// All features disabled
    pub fn none() -> Self {
        Self {
            general_settings: false,
            query_log_config: false,
            stats_config: false,
            client_settings: false,
            services: false,
            filters: false,
            theme: false,
            tls_config: false,
            dns: DnsFeatures {
                access_lists: false,
                server_config: false,
                rewrites: false,
            },
            dhcp: DhcpFeatures {
                server_config: false,
                static_leases: false,
            },
        }
    }

    /// Names of all disabled flags, for the startup log
    pub fn disabled(&self) -> Vec<&'static str> {
        [
            ("general_settings", self.general_settings),
            ("query_log_config", self.query_log_config),
            ("stats_config", self.stats_config),
            ("client_settings", self.client_settings),
            ("services", self.services),
            ("filters", self.filters),
            ("theme", self.theme),
            ("tls_config", self.tls_config),
            ("dns.access_lists", self.dns.access_lists),
            ("dns.server_config", self.dns.server_config),
            ("dns.rewrites", self.dns.rewrites),
            ("dhcp.server_config", self.dhcp.server_config),
            ("dhcp.static_leases", self.dhcp.static_leases),
        ]
        .into_iter()
        .filter(|(_, enabled)| !enabled)
        .map(|(name, _)| name)
        .collect()
    }
}

impl Default for Features {
    fn default() -> Self {
        Self {
            general_settings: true,
            query_log_config: true,
            stats_config: true,
            client_settings: true,
            services: true,
            filters: true,
            theme: true,
            tls_config: true,
            dns: DnsFeatures::default(),
            dhcp: DhcpFeatures::default(),
        }
    }
}

impl Default for DnsFeatures {
    fn default() -> Self {
        Self {
            access_lists: true,
            server_config: true,
            rewrites: true,
        }
    }
}

impl Default for DhcpFeatures {
    fn default() -> Self {
        Self {
            server_config: true,
            static_leases: true,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the engine event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    1000
}
