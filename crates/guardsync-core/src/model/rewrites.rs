//! DNS rewrites

use crate::merge::Mergeable;
use serde::{Deserialize, Serialize};

/// A DNS rewrite: queries for `domain` are answered with `answer`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RewriteEntry {
    /// Domain or wildcard, e.g. `*.lan`
    pub domain: String,
    /// IP address or canonical name
    pub answer: String,
}

impl RewriteEntry {
    pub fn new(domain: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            answer: answer.into(),
        }
    }

    /// `domain#answer`
    pub fn key(&self) -> String {
        format!("{}#{}", self.domain, self.answer)
    }
}

impl Mergeable for RewriteEntry {
    type Key = String;

    fn merge_key(&self) -> String {
        self.key()
    }

    // the key covers every field
    fn same_content(&self, _other: &Self) -> bool {
        true
    }
}
