//! Resource model
//!
//! Wire types of the appliance control API, one module per resource family.
//! Fields an instance may leave unset are `Option`s so "unset" and "zero"
//! never compare equal by accident. Lists the API may send as `null` are
//! read as empty.
//!
//! Each type that is compared against the origin has an explicit equality
//! method (`matches`, or [`Mergeable::same_content`](crate::merge::Mergeable)
//! for list items) that canonicalizes order-insensitive fields first.

pub mod clients;
pub mod dhcp;
pub mod dns;
pub mod filters;
pub mod rewrites;
pub mod settings;

pub use clients::{Client, Clients};
pub use dhcp::{DhcpServerConfig, DhcpStatus, DhcpV4Config, DhcpV6Config, StaticLease};
pub use dns::{AccessList, DnsConfig};
pub use filters::{Filter, FilterKind, FilterStatus};
pub use rewrites::RewriteEntry;
pub use settings::{
    BlockedServicesSchedule, DayRange, ProfileInfo, QueryLogConfig, SafeSearchConfig, Schedule,
    ServerStatus, StatsConfig, TlsConfig,
};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sorted copy of a string list, for order-insensitive comparison
pub(crate) fn sorted(list: &[String]) -> Vec<String> {
    let mut list = list.to_vec();
    list.sort();
    list
}

/// Order-insensitive equality of two string lists
pub(crate) fn same_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && sorted(a) == sorted(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_set() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string(), "x".to_string()];
        assert!(same_set(&a, &b));
        assert!(!same_set(&a, &["x".to_string()]));
        assert!(same_set(&[], &[]));
    }
}
