//! Appliance version handling
//!
//! Versions are reported like `v0.107.43` or `0.108.0-b.5`. Only digits and
//! dots are significant for comparison.

use std::cmp::Ordering;

/// Oldest appliance version whose control API this crate speaks
pub const MIN_VERSION: &str = "0.107.0";

/// Strip everything except digits and dots
pub fn sanitize(version: &str) -> String {
    version
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Compare two versions numerically, component by component
///
/// Missing components count as zero, so `0.107` equals `0.107.0`.
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = components(a);
    let b = components(b);
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Whether `version` is at least [`MIN_VERSION`]
pub fn is_supported(version: &str) -> bool {
    compare(version, MIN_VERSION) != Ordering::Less
}

/// Whether two reported versions are the same release
pub fn same(a: &str, b: &str) -> bool {
    compare(a, b) == Ordering::Equal
}

fn components(version: &str) -> Vec<u64> {
    sanitize(version)
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}
