//! Single-object settings: status, profile, toggles, schedules, log and
//! statistics configuration, TLS

use super::{null_as_default, same_set};
use serde::{Deserialize, Serialize};

/// Response of the status endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub protection_enabled: bool,
    #[serde(default)]
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,
}

/// UI profile of the logged in user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub theme: String,
}

impl ProfileInfo {
    /// Profile to write to this replica so it matches `origin`, if any
    ///
    /// Language always follows the origin. The theme follows it only when
    /// `with_theme` is set. The replica's user name is kept.
    pub fn should_sync_for(&self, origin: &ProfileInfo, with_theme: bool) -> Option<ProfileInfo> {
        let mut merged = self.clone();
        if !origin.language.is_empty() {
            merged.language = origin.language.clone();
        }
        if with_theme && !origin.theme.is_empty() {
            merged.theme = origin.theme.clone();
        }

        if merged.language != self.language || merged.theme != self.theme {
            Some(merged)
        } else {
            None
        }
    }
}

/// Safe search switches, global or per client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeSearchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duckduckgo: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecosia: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixabay: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yandex: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<bool>,
}

impl SafeSearchConfig {
    pub fn matches(&self, other: &Self) -> bool {
        self == other
    }
}

/// Active window of one weekday, in milliseconds since midnight
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub end: u64,
}

/// Weekly schedule used for blocked services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun: Option<DayRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mon: Option<DayRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tue: Option<DayRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wed: Option<DayRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thu: Option<DayRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fri: Option<DayRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<DayRange>,
}

impl Schedule {
    fn days(&self) -> [Option<DayRange>; 7] {
        [self.sun, self.mon, self.tue, self.wed, self.thu, self.fri, self.sat]
    }

    /// Whether any weekday has a window
    pub fn has_days(&self) -> bool {
        self.days().iter().any(Option::is_some)
    }

    /// Schedule with the timezone dropped when no weekday is set
    pub fn normalized(&self) -> Schedule {
        let mut normalized = self.clone();
        if !self.has_days() {
            normalized.time_zone = None;
        }
        normalized
    }

    /// Equality of two optional schedules; an unset schedule equals an empty one
    pub fn equivalent(a: Option<&Schedule>, b: Option<&Schedule>) -> bool {
        let a = a.cloned().unwrap_or_default().normalized();
        let b = b.cloned().unwrap_or_default().normalized();
        a == b
    }
}

/// Globally blocked services and when the block applies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockedServicesSchedule {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
}

impl BlockedServicesSchedule {
    pub fn matches(&self, other: &Self) -> bool {
        same_set(&self.ids, &other.ids)
            && Schedule::equivalent(self.schedule.as_ref(), other.schedule.as_ref())
    }
}

/// Query log configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryLogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Retention in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymize_client_ip: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ignored: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_enabled: Option<bool>,
}

impl QueryLogConfig {
    pub fn matches(&self, other: &Self) -> bool {
        self.enabled == other.enabled
            && self.interval == other.interval
            && self.anonymize_client_ip == other.anonymize_client_ip
            && same_set(&self.ignored, &other.ignored)
            && self.ignored_enabled == other.ignored_enabled
    }
}

/// Statistics configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Retention in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ignored: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_enabled: Option<bool>,
}

impl StatsConfig {
    pub fn matches(&self, other: &Self) -> bool {
        self.enabled == other.enabled
            && self.interval == other.interval
            && same_set(&self.ignored, &other.ignored)
            && self.ignored_enabled == other.ignored_enabled
    }
}

/// TLS / encryption configuration
///
/// Only configuration fields are modelled; certificate validation results
/// the status endpoint also returns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_https: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_https: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_dns_over_tls: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_dns_over_quic: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_saved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serve_plain_dns: Option<bool>,
}

impl TlsConfig {
    pub fn matches(&self, other: &Self) -> bool {
        self == other
    }
}
