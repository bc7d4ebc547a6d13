//! Filter lists and filtering status

use super::null_as_default;
use crate::merge::Mergeable;
use serde::{Deserialize, Serialize};

/// Which filter collection a list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Block lists
    Blocklist,
    /// Allow lists (the API calls them whitelists)
    Allowlist,
}

impl FilterKind {
    /// Value of the API's `whitelist` flag
    pub fn is_whitelist(self) -> bool {
        matches!(self, Self::Allowlist)
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blocklist => f.write_str("blocklist"),
            Self::Allowlist => f.write_str("allowlist"),
        }
    }
}

/// A subscribed filter list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Filter {
    pub fn new(url: impl Into<String>, name: impl Into<String>, enabled: bool) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            enabled,
            id: None,
            rules_count: None,
            last_updated: None,
        }
    }
}

impl Mergeable for Filter {
    type Key = String;

    fn merge_key(&self) -> String {
        self.url.clone()
    }

    // id, rule count and last update differ per instance
    fn same_content(&self, other: &Self) -> bool {
        self.name == other.name && self.enabled == other.enabled
    }
}

/// Response of the filtering status endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterStatus {
    #[serde(default)]
    pub enabled: bool,
    /// Update interval in hours
    #[serde(default)]
    pub interval: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: Vec<Filter>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub whitelist_filters: Vec<Filter>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_rules: Vec<String>,
}

impl FilterStatus {
    /// Filters of one collection
    pub fn list(&self, kind: FilterKind) -> &[Filter] {
        match kind {
            FilterKind::Blocklist => &self.filters,
            FilterKind::Allowlist => &self.whitelist_filters,
        }
    }
}
