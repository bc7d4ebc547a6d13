// # Appliance HTTP Client
//
// This crate provides the HTTP implementation of `ApplianceClient`: one
// client per instance, talking to its JSON control API.
//
// ## Behavior
//
// - One HTTP request per trait call, no retries (a failed pass is retried
//   by the next trigger)
// - HTTP timeout configured per factory (30 seconds by default)
// - Redirects are never followed; a redirect to the install page means the
//   instance still needs its initial setup
// - Non-2xx responses map to typed errors (401/403, 404, 429, 5xx)
//
// ## Security Requirements
//
// - Passwords and cookies NEVER appear in logs or Debug output
// - Basic auth is used when username and password are both set, otherwise
//   the configured session cookie is sent
//
// ## API Reference
//
// Every path is relative to `{url}/{api_path}/`, e.g. `GET /control/status`.
//
// - Status: GET `status`; setup: POST `install/configure`
// - Filtering: GET `filtering/status`, POST `filtering/{add_url,remove_url,set_url,refresh,set_rules,config}`
// - Rewrites: GET `rewrite/list`, POST `rewrite/{add,delete}`
// - Clients: GET `clients`, POST `clients/{add,update,delete}`
// - DHCP: GET `dhcp/status`, POST `dhcp/{set_config,add_static_lease,remove_static_lease}`

use async_trait::async_trait;
use guardsync_core::config::InstanceConfig;
use guardsync_core::model::{
    AccessList, BlockedServicesSchedule, Client, Clients, DhcpServerConfig, DhcpStatus, DnsConfig,
    Filter, FilterKind, FilterStatus, ProfileInfo, QueryLogConfig, RewriteEntry,
    SafeSearchConfig, ServerStatus, StaticLease, StatsConfig, TlsConfig,
};
use guardsync_core::traits::{ApplianceClient, ClientFactory};
use guardsync_core::{Error, Result};
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Port the DNS server listens on after the initial setup
const SETUP_DNS_PORT: u16 = 53;

/// HTTP client for one instance's control API
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
pub struct HttpApplianceClient {
    /// Host label used in logs and status
    host: String,

    /// API base URL, always ending in `/`
    base: Url,

    /// Basic auth username
    username: Option<String>,

    /// Basic auth password
    /// ⚠️ NEVER log this value
    password: Option<String>,

    /// HTTP client with default headers, timeout and redirect policy
    client: reqwest::Client,
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for HttpApplianceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApplianceClient")
            .field("host", &self.host)
            .field("base", &self.base.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Response of the `{mode}/status` toggle endpoints
#[derive(Debug, Deserialize)]
struct EnableStatus {
    #[serde(default)]
    enabled: bool,
}

impl HttpApplianceClient {
    /// Create a client for an instance
    ///
    /// # Parameters
    ///
    /// - `instance`: Instance descriptor
    /// - `timeout`: Timeout for each request
    ///
    /// # Returns
    ///
    /// - `Ok(HttpApplianceClient)`: Ready to use; no request has been made
    /// - `Err(Error::Config)`: Invalid URL or request header
    /// - `Err(Error::Client)`: The HTTP client could not be built
    pub fn new(instance: &InstanceConfig, timeout: Duration) -> Result<Self> {
        let base = api_base(&instance.url, &instance.api_path)?;
        let credentials = match (&instance.username, &instance.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u.clone(), p.clone())),
            _ => None,
        };

        let mut headers = default_headers(instance)?;
        if credentials.is_none() {
            if let Some(cookie) = instance.cookie.as_deref().filter(|c| c.contains('=')) {
                let mut value = HeaderValue::from_str(cookie)
                    .map_err(|_| Error::config("Cookie contains invalid characters"))?;
                value.set_sensitive(true);
                headers.insert(COOKIE, value);
            }
        }

        if instance.insecure_skip_verify {
            tracing::warn!("TLS certificate verification disabled for {}", instance.host());
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(instance.insecure_skip_verify)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::client(format!("Failed to build HTTP client: {e}")))?;

        let (username, password) = match credentials {
            Some((u, p)) => (Some(u), Some(p)),
            None => (None, None),
        };

        Ok(Self {
            host: instance.host().to_string(),
            base,
            username,
            password,
            client,
        })
    }

    /// Full URL of an API path
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::config(format!("Invalid API path {path}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None::<&()>, true).await?;
        response
            .json()
            .await
            .map_err(|e| Error::http(format!("Invalid response from {path}: {e}")))
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::POST, path, Some(body), true).await?;
        Ok(())
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::PUT, path, Some(body), true).await?;
        Ok(())
    }

    /// Send one request and map non-success responses to errors
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authenticate: bool,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint(path)?;
        tracing::debug!(host = %self.host, %method, path, "Sending request");

        let mut request = self.client.request(method.clone(), url);
        if authenticate {
            if let Some(username) = &self.username {
                request = request.basic_auth(username, self.password.as_deref());
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("{method} {path} failed: {e}")))?;

        self.check(path, response).await
    }

    /// Map a response to an error unless it succeeded
    async fn check(&self, path: &str, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        tracing::debug!(host = %self.host, path, status = status.as_u16(), "Got response");
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::FOUND && redirects_to_install(&response) {
            return Err(Error::SetupNeeded);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        let detail = if error_text.trim().is_empty() {
            status.to_string()
        } else {
            format!("{} ({})", status, error_text.trim())
        };

        match status.as_u16() {
            401 | 403 => {
                tracing::error!(
                    "Authentication failed on {} ({}), check username, password or cookie",
                    self.host,
                    status
                );
                Err(Error::auth(format!("{path}: {detail}")))
            }
            404 => Err(Error::api(404, format!("Endpoint not found: {path}"))),
            429 => Err(Error::api(429, format!("Rate limit exceeded: {detail}"))),
            code @ 500..=599 => Err(Error::api(code, format!("Server error: {detail}"))),
            code => Err(Error::api(code, detail)),
        }
    }

    async fn toggle_status(&self, mode: &str) -> Result<bool> {
        let status: EnableStatus = self.get(&format!("{mode}/status")).await?;
        Ok(status.enabled)
    }

    async fn toggle(&self, mode: &str, enabled: bool) -> Result<()> {
        tracing::info!("Toggle {} on {}: {}", mode, self.host, enabled);
        let target = if enabled { "enable" } else { "disable" };
        self.send(Method::POST, &format!("{mode}/{target}"), None::<&()>, true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ApplianceClient for HttpApplianceClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn status(&self) -> Result<ServerStatus> {
        self.get("status").await
    }

    /// Complete the initial setup with this client's credentials
    ///
    /// The request itself is sent without authentication.
    async fn setup(&self) -> Result<()> {
        tracing::info!("Setting up new instance {}", self.host);
        let web_port = self.base.port_or_known_default().unwrap_or(80);
        let body = json!({
            "web": { "ip": "0.0.0.0", "port": web_port, "status": "", "can_autofix": false },
            "dns": { "ip": "0.0.0.0", "port": SETUP_DNS_PORT, "status": "", "can_autofix": false },
            "username": self.username.as_deref().unwrap_or_default(),
            "password": self.password.as_deref().unwrap_or_default(),
        });
        self.send(Method::POST, "install/configure", Some(&body), false)
            .await?;
        Ok(())
    }

    async fn toggle_protection(&self, enabled: bool) -> Result<()> {
        tracing::info!("Toggle protection on {}: {}", self.host, enabled);
        self.post("dns_config", &json!({ "protection_enabled": enabled }))
            .await
    }

    async fn profile_info(&self) -> Result<ProfileInfo> {
        self.get("profile").await
    }

    async fn set_profile_info(&self, profile: &ProfileInfo) -> Result<()> {
        self.put("profile/update", profile).await
    }

    async fn parental(&self) -> Result<bool> {
        self.toggle_status("parental").await
    }

    async fn toggle_parental(&self, enabled: bool) -> Result<()> {
        self.toggle("parental", enabled).await
    }

    async fn safe_browsing(&self) -> Result<bool> {
        self.toggle_status("safebrowsing").await
    }

    async fn toggle_safe_browsing(&self, enabled: bool) -> Result<()> {
        self.toggle("safebrowsing", enabled).await
    }

    async fn safe_search_config(&self) -> Result<SafeSearchConfig> {
        self.get("safesearch/status").await
    }

    async fn set_safe_search_config(&self, config: &SafeSearchConfig) -> Result<()> {
        self.put("safesearch/settings", config).await
    }

    async fn rewrite_list(&self) -> Result<Vec<RewriteEntry>> {
        let entries: Option<Vec<RewriteEntry>> = self.get("rewrite/list").await?;
        Ok(entries.unwrap_or_default())
    }

    async fn add_rewrite_entry(&self, entry: &RewriteEntry) -> Result<()> {
        self.post("rewrite/add", entry).await
    }

    async fn delete_rewrite_entry(&self, entry: &RewriteEntry) -> Result<()> {
        self.post("rewrite/delete", entry).await
    }

    async fn filtering(&self) -> Result<FilterStatus> {
        self.get("filtering/status").await
    }

    async fn add_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()> {
        self.post(
            "filtering/add_url",
            &json!({
                "name": filter.name,
                "url": filter.url,
                "whitelist": kind.is_whitelist(),
            }),
        )
        .await
    }

    async fn update_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()> {
        self.post(
            "filtering/set_url",
            &json!({
                "url": filter.url,
                "whitelist": kind.is_whitelist(),
                "data": { "name": filter.name, "url": filter.url, "enabled": filter.enabled },
            }),
        )
        .await
    }

    async fn delete_filter(&self, kind: FilterKind, filter: &Filter) -> Result<()> {
        self.post(
            "filtering/remove_url",
            &json!({ "url": filter.url, "whitelist": kind.is_whitelist() }),
        )
        .await
    }

    async fn refresh_filters(&self, kind: FilterKind) -> Result<()> {
        self.post(
            "filtering/refresh",
            &json!({ "whitelist": kind.is_whitelist() }),
        )
        .await
    }

    async fn set_custom_rules(&self, rules: &[String]) -> Result<()> {
        self.post("filtering/set_rules", &json!({ "rules": rules }))
            .await
    }

    async fn toggle_filtering(&self, enabled: bool, interval: u32) -> Result<()> {
        self.post(
            "filtering/config",
            &json!({ "enabled": enabled, "interval": interval }),
        )
        .await
    }

    async fn blocked_services_schedule(&self) -> Result<BlockedServicesSchedule> {
        self.get("blocked_services/get").await
    }

    async fn set_blocked_services_schedule(&self, schedule: &BlockedServicesSchedule) -> Result<()> {
        self.put("blocked_services/update", schedule).await
    }

    async fn clients(&self) -> Result<Clients> {
        self.get("clients").await
    }

    async fn add_client(&self, client: &Client) -> Result<()> {
        self.post("clients/add", client).await
    }

    async fn update_client(&self, client: &Client) -> Result<()> {
        self.post(
            "clients/update",
            &json!({ "name": client.name, "data": client }),
        )
        .await
    }

    async fn delete_client(&self, client: &Client) -> Result<()> {
        self.post("clients/delete", &json!({ "name": client.name }))
            .await
    }

    async fn query_log_config(&self) -> Result<QueryLogConfig> {
        self.get("querylog/config").await
    }

    async fn set_query_log_config(&self, config: &QueryLogConfig) -> Result<()> {
        self.put("querylog/config/update", config).await
    }

    async fn stats_config(&self) -> Result<StatsConfig> {
        self.get("stats/config").await
    }

    async fn set_stats_config(&self, config: &StatsConfig) -> Result<()> {
        self.put("stats/config/update", config).await
    }

    async fn access_list(&self) -> Result<AccessList> {
        self.get("access/list").await
    }

    async fn set_access_list(&self, list: &AccessList) -> Result<()> {
        self.post("access/set", list).await
    }

    async fn dns_config(&self) -> Result<DnsConfig> {
        self.get("dns_info").await
    }

    async fn set_dns_config(&self, config: &DnsConfig) -> Result<()> {
        self.post("dns_config", config).await
    }

    async fn dhcp_status(&self) -> Result<DhcpStatus> {
        self.get("dhcp/status").await
    }

    async fn set_dhcp_config(&self, config: &DhcpServerConfig) -> Result<()> {
        self.post("dhcp/set_config", config).await
    }

    async fn add_dhcp_static_lease(&self, lease: &StaticLease) -> Result<()> {
        self.post("dhcp/add_static_lease", lease).await
    }

    async fn delete_dhcp_static_lease(&self, lease: &StaticLease) -> Result<()> {
        self.post("dhcp/remove_static_lease", lease).await
    }

    async fn tls_config(&self) -> Result<TlsConfig> {
        self.get("tls/status").await
    }

    async fn set_tls_config(&self, config: &TlsConfig) -> Result<()> {
        self.post("tls/configure", config).await
    }
}

/// API base URL: `url` plus the cleaned `api_path`, with a trailing slash
/// so relative endpoint paths join below it
fn api_base(url: &str, api_path: &str) -> Result<Url> {
    let mut base =
        Url::parse(url).map_err(|e| Error::config(format!("Invalid instance URL {url}: {e}")))?;

    let joined = format!("{}/{}", base.path(), api_path);
    let segments: Vec<&str> = joined
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.is_empty() {
        base.set_path("/");
    } else {
        base.set_path(&format!("/{}/", segments.join("/")));
    }
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}

/// Extra request headers configured for an instance
fn default_headers(instance: &InstanceConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &instance.request_headers {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| Error::config(format!("Invalid request header name: {name}")))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| Error::config(format!("Invalid value for request header {name}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn redirects_to_install(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|location| location.ends_with("install.html"))
}

/// Factory for creating HTTP appliance clients
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    timeout: Duration,
}

impl HttpClientFactory {
    /// Create a factory whose clients use `timeout` for every request
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self, instance: &InstanceConfig) -> Result<Box<dyn ApplianceClient>> {
        Ok(Box::new(HttpApplianceClient::new(instance, self.timeout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_default_path() {
        let base = api_base("http://192.168.1.2:3000", "/control").unwrap();
        assert_eq!(base.as_str(), "http://192.168.1.2:3000/control/");
        assert_eq!(
            base.join("filtering/status").unwrap().as_str(),
            "http://192.168.1.2:3000/control/filtering/status"
        );
    }

    #[test]
    fn test_api_base_cleans_path() {
        let base = api_base("https://dns.example.com/adguard/", "control//./").unwrap();
        assert_eq!(base.as_str(), "https://dns.example.com/adguard/control/");

        let base = api_base("http://host", "").unwrap();
        assert_eq!(base.as_str(), "http://host/");
    }

    #[test]
    fn test_api_base_rejects_invalid_url() {
        assert!(matches!(api_base("not a url", "/control"), Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_creation() {
        let factory = HttpClientFactory::default();
        let instance = InstanceConfig::new("http://192.168.1.2:3000").with_credentials("admin", "pw");

        let client = factory.create(&instance).unwrap();
        assert_eq!(client.host(), "192.168.1.2:3000");
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let mut instance = InstanceConfig::new("http://192.168.1.2:3000");
        instance
            .request_headers
            .insert("Bad Header".to_string(), "value".to_string());

        let result = HttpApplianceClient::new(&instance, DEFAULT_HTTP_TIMEOUT);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_password_not_exposed_in_debug() {
        let instance =
            InstanceConfig::new("http://192.168.1.2:3000").with_credentials("admin", "secret_pw_123");
        let client = HttpApplianceClient::new(&instance, DEFAULT_HTTP_TIMEOUT).unwrap();

        let debug_str = format!("{:?}", client);
        assert!(!debug_str.contains("secret_pw_123"));
        assert!(debug_str.contains("<REDACTED>"));
        assert!(debug_str.contains("HttpApplianceClient"));
    }

    #[test]
    fn test_credentials_need_both_parts() {
        let mut instance = InstanceConfig::new("http://192.168.1.2:3000");
        instance.username = Some("admin".to_string());

        let client = HttpApplianceClient::new(&instance, DEFAULT_HTTP_TIMEOUT).unwrap();
        assert!(client.username.is_none());
        assert!(client.password.is_none());
    }
}
