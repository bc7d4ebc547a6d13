//! Daemon configuration from environment variables
//!
//! All configuration is read from `GUARDSYNC_*` variables. Parsing goes
//! through a lookup function so tests never touch the process environment.

use anyhow::{Context, Result};
use guardsync_core::config::{Features, InstanceConfig, SyncConfig};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

const PREFIX: &str = "GUARDSYNC";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Origin, replicas, features and error policy
    pub sync: SyncConfig,

    /// Seconds between passes; no periodic passes when unset
    pub interval_secs: Option<u64>,

    /// Run a pass right after startup
    pub run_on_start: bool,

    /// Port of the HTTP API; no API when unset
    pub api_port: Option<u16>,

    /// Timeout of each request to an instance
    pub http_timeout_secs: u64,

    /// How long a running pass may take to finish on shutdown
    pub shutdown_timeout_secs: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |suffix: &str| {
            lookup(&format!("{PREFIX}_{suffix}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let origin_url = var("ORIGIN_URL").context(
            "GUARDSYNC_ORIGIN_URL is required. \
            Set it via: export GUARDSYNC_ORIGIN_URL=http://192.168.1.2:3000",
        )?;
        let origin = instance(&var, "ORIGIN", origin_url)?;

        let mut replicas = Vec::new();
        for n in 1.. {
            let prefix = format!("REPLICA{n}");
            let Some(url) = var(&format!("{prefix}_URL")) else {
                break;
            };
            let mut replica = instance(&var, &prefix, url)?;
            replica.auto_setup = flag(&var, &format!("{prefix}_AUTO_SETUP"), false)?;
            replica.interface_name = var(&format!("{prefix}_INTERFACE_NAME"));
            replica.dhcp_server_enabled = var(&format!("{prefix}_DHCP_SERVER_ENABLED"))
                .map(|v| parse_bool(&format!("{PREFIX}_{prefix}_DHCP_SERVER_ENABLED"), &v))
                .transpose()?;
            replicas.push(replica);
        }

        let mut sync = SyncConfig::new(origin, replicas);
        sync.continue_on_error = flag(&var, "CONTINUE_ON_ERROR", false)?;
        sync.features = features(&var)?;

        Ok(Self {
            sync,
            interval_secs: number(&var, "INTERVAL_SECS")?,
            run_on_start: flag(&var, "RUN_ON_START", false)?,
            api_port: number(&var, "API_PORT")?,
            http_timeout_secs: number(&var, "HTTP_TIMEOUT_SECS")?.unwrap_or(30),
            shutdown_timeout_secs: number(&var, "SHUTDOWN_TIMEOUT_SECS")?.unwrap_or(10),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks instance descriptors, numeric ranges, and the log level.
    pub fn validate(&self) -> Result<()> {
        if self.sync.replicas.is_empty() {
            anyhow::bail!(
                "At least one replica is required. \
                Set it via: export GUARDSYNC_REPLICA1_URL=http://192.168.1.3:3000"
            );
        }

        self.sync
            .validate()
            .context("Invalid origin or replica configuration")?;

        if let Some(interval) = self.interval_secs
            && !(10..=86_400).contains(&interval)
        {
            anyhow::bail!(
                "GUARDSYNC_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                interval
            );
        }

        if !(1..=300).contains(&self.http_timeout_secs) {
            anyhow::bail!(
                "GUARDSYNC_HTTP_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.http_timeout_secs
            );
        }

        if self.api_port == Some(0) {
            anyhow::bail!("GUARDSYNC_API_PORT must be between 1 and 65535");
        }

        self.log_level()?;
        Ok(())
    }

    /// Parsed log level
    pub fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "GUARDSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Neither periodic passes nor an API: run one pass and exit
    pub fn is_one_shot(&self) -> bool {
        self.interval_secs.is_none() && self.api_port.is_none()
    }
}

/// Instance descriptor from the `{prefix}_*` variables
fn instance(
    var: &impl Fn(&str) -> Option<String>,
    prefix: &str,
    url: String,
) -> Result<InstanceConfig> {
    let mut instance = InstanceConfig::new(url);
    instance.web_url = var(&format!("{prefix}_WEB_URL"));
    if let Some(api_path) = var(&format!("{prefix}_API_PATH")) {
        instance.api_path = api_path;
    }
    instance.username = var(&format!("{prefix}_USERNAME"));
    instance.password = var(&format!("{prefix}_PASSWORD"));
    instance.cookie = var(&format!("{prefix}_COOKIE"));
    instance.insecure_skip_verify = flag(var, &format!("{prefix}_INSECURE_SKIP_VERIFY"), false)?;
    if let Some(headers) = var(&format!("{prefix}_REQUEST_HEADERS")) {
        instance.request_headers = parse_headers(&format!("{PREFIX}_{prefix}_REQUEST_HEADERS"), &headers)?;
    }
    Ok(instance)
}

fn features(var: &impl Fn(&str) -> Option<String>) -> Result<Features> {
    let mut features = Features::default();
    let feature = |name: &str| flag(var, &format!("FEATURES_{name}"), true);

    features.general_settings = feature("GENERAL_SETTINGS")?;
    features.query_log_config = feature("QUERY_LOG_CONFIG")?;
    features.stats_config = feature("STATS_CONFIG")?;
    features.client_settings = feature("CLIENT_SETTINGS")?;
    features.services = feature("SERVICES")?;
    features.filters = feature("FILTERS")?;
    features.theme = feature("THEME")?;
    features.tls_config = feature("TLS_CONFIG")?;
    features.dns.access_lists = feature("DNS_ACCESS_LISTS")?;
    features.dns.server_config = feature("DNS_SERVER_CONFIG")?;
    features.dns.rewrites = feature("DNS_REWRITES")?;
    features.dhcp.server_config = feature("DHCP_SERVER_CONFIG")?;
    features.dhcp.static_leases = feature("DHCP_STATIC_LEASES")?;
    Ok(features)
}

fn flag(var: &impl Fn(&str) -> Option<String>, suffix: &str, default: bool) -> Result<bool> {
    match var(suffix) {
        Some(value) => parse_bool(&format!("{PREFIX}_{suffix}"), &value),
        None => Ok(default),
    }
}

fn number<T>(var: &impl Fn(&str) -> Option<String>, suffix: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(suffix)
        .map(|value| {
            value.parse::<T>().map_err(|e| {
                anyhow::anyhow!("{PREFIX}_{suffix} must be a number. Got '{value}': {e}")
            })
        })
        .transpose()
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{name} must be true or false. Got: '{value}'"),
    }
}

/// `Name:value,Other:value`
fn parse_headers(name: &str, value: &str) -> Result<BTreeMap<String, String>> {
    let mut headers = BTreeMap::new();
    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, val)) = pair.split_once(':') else {
            anyhow::bail!("{name} entries must look like 'Name:value'. Got: '{pair}'");
        };
        headers.insert(key.trim().to_string(), val.trim().to_string());
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("GUARDSYNC_ORIGIN_URL", "http://192.168.1.2:3000"),
        ("GUARDSYNC_REPLICA1_URL", "http://192.168.1.3:3000"),
    ];

    #[test]
    fn test_minimal_config_defaults() {
        let config = load(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.sync.replicas.len(), 1);
        assert_eq!(config.sync.origin.api_path, "/control");
        assert_eq!(config.sync.features, Features::default());
        assert!(!config.sync.continue_on_error);
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.shutdown_timeout_secs, 10);
        assert!(config.is_one_shot());
        assert_eq!(config.log_level().unwrap(), Level::INFO);
    }

    #[test]
    fn test_missing_origin() {
        let err = load(&[("GUARDSYNC_REPLICA1_URL", "http://r1")]).unwrap_err();
        assert!(err.to_string().contains("GUARDSYNC_ORIGIN_URL"));
    }

    #[test]
    fn test_no_replicas() {
        let config = load(&[("GUARDSYNC_ORIGIN_URL", "http://o")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GUARDSYNC_REPLICA1_URL"));
    }

    #[test]
    fn test_replicas_are_numbered_from_one_without_gaps() {
        let config = load(&[
            ("GUARDSYNC_ORIGIN_URL", "http://o:3000"),
            ("GUARDSYNC_REPLICA1_URL", "http://r1:3000"),
            ("GUARDSYNC_REPLICA1_AUTO_SETUP", "true"),
            ("GUARDSYNC_REPLICA1_INTERFACE_NAME", "br0"),
            ("GUARDSYNC_REPLICA1_DHCP_SERVER_ENABLED", "false"),
            ("GUARDSYNC_REPLICA2_URL", "http://r2:3000"),
            ("GUARDSYNC_REPLICA2_USERNAME", "admin"),
            ("GUARDSYNC_REPLICA2_PASSWORD", "pw"),
            ("GUARDSYNC_REPLICA4_URL", "http://r4:3000"),
        ])
        .unwrap();

        assert_eq!(config.sync.replicas.len(), 2);
        let r1 = &config.sync.replicas[0];
        assert!(r1.auto_setup);
        assert_eq!(r1.interface_name.as_deref(), Some("br0"));
        assert_eq!(r1.dhcp_server_enabled, Some(false));
        let r2 = &config.sync.replicas[1];
        assert_eq!(r2.username.as_deref(), Some("admin"));
        assert!(!r2.auto_setup);
    }

    #[test]
    fn test_origin_settings() {
        let config = load(&[
            ("GUARDSYNC_ORIGIN_URL", "https://o"),
            ("GUARDSYNC_ORIGIN_API_PATH", "/adguard/control"),
            ("GUARDSYNC_ORIGIN_COOKIE", "agh_session=abc"),
            ("GUARDSYNC_ORIGIN_INSECURE_SKIP_VERIFY", "yes"),
            ("GUARDSYNC_ORIGIN_REQUEST_HEADERS", "X-Proxy: guardsync, X-Env:lab"),
            ("GUARDSYNC_REPLICA1_URL", "https://r1"),
        ])
        .unwrap();

        let origin = &config.sync.origin;
        assert_eq!(origin.api_path, "/adguard/control");
        assert_eq!(origin.cookie.as_deref(), Some("agh_session=abc"));
        assert!(origin.insecure_skip_verify);
        assert_eq!(origin.request_headers.get("X-Proxy").map(String::as_str), Some("guardsync"));
        assert_eq!(origin.request_headers.get("X-Env").map(String::as_str), Some("lab"));
    }

    #[test]
    fn test_feature_flags() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_FEATURES_THEME", "false"));
        vars.push(("GUARDSYNC_FEATURES_DHCP_STATIC_LEASES", "0"));
        vars.push(("GUARDSYNC_FEATURES_DNS_REWRITES", "off"));
        let config = load(&vars).unwrap();

        let features = config.sync.features;
        assert!(!features.theme);
        assert!(!features.dhcp.static_leases);
        assert!(!features.dns.rewrites);
        assert!(features.dhcp.server_config);
        assert!(features.filters);
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_CONTINUE_ON_ERROR", "maybe"));
        assert!(load(&vars).is_err());

        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_API_PORT", "http"));
        assert!(load(&vars).is_err());

        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_ORIGIN_REQUEST_HEADERS", "no-colon"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_interval_range() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_INTERVAL_SECS", "5"));
        assert!(load(&vars).unwrap().validate().is_err());

        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_INTERVAL_SECS", "600"));
        let config = load(&vars).unwrap();
        config.validate().unwrap();
        assert!(!config.is_one_shot());
    }

    #[test]
    fn test_timeout_and_log_level_validation() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_HTTP_TIMEOUT_SECS", "0"));
        assert!(load(&vars).unwrap().validate().is_err());

        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_LOG_LEVEL", "verbose"));
        assert!(load(&vars).unwrap().validate().is_err());

        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_LOG_LEVEL", "DEBUG"));
        assert_eq!(load(&vars).unwrap().log_level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn test_origin_as_replica_is_rejected() {
        let config = load(&[
            ("GUARDSYNC_ORIGIN_URL", "http://o:3000"),
            ("GUARDSYNC_REPLICA1_URL", "http://o:3000"),
        ])
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_port_disables_one_shot() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("GUARDSYNC_API_PORT", "8080"));
        let config = load(&vars).unwrap();
        assert_eq!(config.api_port, Some(8080));
        assert!(!config.is_one_shot());
    }
}
