//! Persistent clients

use super::settings::{SafeSearchConfig, Schedule};
use super::{null_as_default, same_set};
use crate::merge::Mergeable;
use serde::{Deserialize, Serialize};

/// A persistent client with its own settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    /// IPs, CIDRs, MACs or client ids identifying the client
    #[serde(default, deserialize_with = "null_as_default")]
    pub ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upstreams: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked_services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_services_schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_global_settings: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_global_blocked_services: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtering_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parental_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safebrowsing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_search: Option<SafeSearchConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_querylog: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_statistics: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstreams_cache_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstreams_cache_size: Option<u32>,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Field-by-field equality, ignoring list order and the schedule
    /// timezone when no weekday is set
    pub fn matches(&self, other: &Self) -> bool {
        self.name == other.name
            && same_set(&self.ids, &other.ids)
            && same_set(&self.tags, &other.tags)
            && same_set(&self.upstreams, &other.upstreams)
            && same_set(&self.blocked_services, &other.blocked_services)
            && Schedule::equivalent(
                self.blocked_services_schedule.as_ref(),
                other.blocked_services_schedule.as_ref(),
            )
            && self.use_global_settings == other.use_global_settings
            && self.use_global_blocked_services == other.use_global_blocked_services
            && self.filtering_enabled == other.filtering_enabled
            && self.parental_enabled == other.parental_enabled
            && self.safebrowsing_enabled == other.safebrowsing_enabled
            && self.safe_search == other.safe_search
            && self.ignore_querylog == other.ignore_querylog
            && self.ignore_statistics == other.ignore_statistics
            && self.upstreams_cache_enabled == other.upstreams_cache_enabled
            && self.upstreams_cache_size == other.upstreams_cache_size
    }
}

impl Mergeable for Client {
    type Key = String;

    fn merge_key(&self) -> String {
        self.name.clone()
    }

    fn same_content(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

/// Response of the clients endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clients {
    #[serde(default, deserialize_with = "null_as_default")]
    pub clients: Vec<Client>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supported_tags: Vec<String>,
}
