//! Key-based diff between replica and origin collections
//!
//! Every list-shaped resource (rewrites, filters, clients, static leases)
//! is reconciled through [`merge`]. Given what the replica has and what the
//! origin has, it computes the writes that make the replica match.
//!
//! ## Algorithm
//!
//! 1. Index replica items by key. A key seen twice on the replica sends the
//!    extra copy to `deletes`.
//! 2. For each origin item: a key already seen on the origin side is a
//!    duplicate (first occurrence wins). A key missing on the replica is an
//!    add. A key present with different content is an update.
//! 3. Replica items never matched by an origin key are deletes.
//!
//! `adds` and `updates` keep origin order, `deletes` keeps replica order.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

/// An item that can be reconciled by key
pub trait Mergeable: Clone {
    /// Identity of the item within its collection
    type Key: Eq + Hash + Clone + Debug;

    /// The item's key
    fn merge_key(&self) -> Self::Key;

    /// Whether two items with the same key have equal content
    fn same_content(&self, other: &Self) -> bool;
}

/// Writes needed to make a replica collection match the origin
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult<T> {
    /// Origin items missing on the replica
    pub adds: Vec<T>,
    /// Origin items whose replica counterpart differs
    pub updates: Vec<T>,
    /// Replica items to remove
    pub deletes: Vec<T>,
    /// Origin items whose key already appeared earlier on the origin
    pub duplicates: Vec<T>,
}

impl<T> MergeResult<T> {
    /// Whether no write is needed
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

impl<T> Default for MergeResult<T> {
    fn default() -> Self {
        Self {
            adds: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
            duplicates: Vec::new(),
        }
    }
}

/// Compute the writes that turn `replica` into `origin`
pub fn merge<T: Mergeable>(replica: &[T], origin: &[T]) -> MergeResult<T> {
    let mut result = MergeResult::default();

    // first replica index per key; later copies are duplicates to clean up
    let mut index: HashMap<T::Key, usize> = HashMap::with_capacity(replica.len());
    let mut replica_dup = vec![false; replica.len()];
    for (i, item) in replica.iter().enumerate() {
        if index.contains_key(&item.merge_key()) {
            replica_dup[i] = true;
        } else {
            index.insert(item.merge_key(), i);
        }
    }

    let mut matched = vec![false; replica.len()];
    let mut seen_origin: HashSet<T::Key> = HashSet::with_capacity(origin.len());
    for item in origin {
        let key = item.merge_key();
        if !seen_origin.insert(key.clone()) {
            result.duplicates.push(item.clone());
            continue;
        }

        match index.get(&key) {
            None => result.adds.push(item.clone()),
            Some(&i) => {
                matched[i] = true;
                if !replica[i].same_content(item) {
                    result.updates.push(item.clone());
                }
            }
        }
    }

    for (i, item) in replica.iter().enumerate() {
        if replica_dup[i] || !matched[i] {
            result.deletes.push(item.clone());
        }
    }

    result
}
