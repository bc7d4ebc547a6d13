// # Sync Status
//
// In-memory record of the most recent pass, per instance.
//
// ## Purpose
//
// Backs the status and health endpoints. Nothing is persisted: after a
// restart every instance is `pending` until the first pass completes.
//
// ## Health
//
// The system is healthy unless the origin or a replica ended its last pass
// in `partial_failure` or `failure`. `pending` counts as healthy.

use crate::config::InstanceConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of the last pass for one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// No pass has completed yet
    Pending,
    Success,
    /// Errors occurred but every action was attempted
    PartialFailure,
    /// The instance could not be synced
    Failure,
}

impl SyncState {
    pub fn is_failed(self) -> bool {
        matches!(self, Self::PartialFailure | Self::Failure)
    }
}

/// Status of one instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceStatus {
    /// Host of the web interface when configured, else of the API URL
    pub host: String,
    pub url: String,
    pub api_path: String,
    pub state: SyncState,
    /// Reachable and running the expected version
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl InstanceStatus {
    /// Status of an instance no pass has reached yet
    pub fn pending(instance: &InstanceConfig) -> Self {
        Self {
            host: instance.web_host().to_string(),
            url: instance.url.clone(),
            api_path: instance.api_path.clone(),
            state: SyncState::Pending,
            reachable: false,
            version: None,
            protection_enabled: None,
            error: None,
            last_sync: None,
        }
    }

    /// Whether this entry belongs to `instance`
    ///
    /// Matches on URL and API path, the same key replicas are
    /// de-duplicated by.
    pub fn is_for(&self, instance: &InstanceConfig) -> bool {
        self.url == instance.url && self.api_path == instance.api_path
    }
}

/// Status of the origin and every replica
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// A pass is currently running
    pub sync_running: bool,
    pub origin: InstanceStatus,
    pub replicas: Vec<InstanceStatus>,
}

impl SyncStatus {
    /// All instances pending
    pub fn pending(origin: &InstanceConfig, replicas: &[InstanceConfig]) -> Self {
        Self {
            sync_running: false,
            origin: InstanceStatus::pending(origin),
            replicas: replicas.iter().map(InstanceStatus::pending).collect(),
        }
    }

    /// False when the origin or any replica failed its last pass
    pub fn is_healthy(&self) -> bool {
        !self.origin.state.is_failed() && !self.replicas.iter().any(|r| r.state.is_failed())
    }
}

/// Shared, lock-protected status record
///
/// Cloning shares the same record.
#[derive(Debug, Clone)]
pub struct StatusStore {
    inner: Arc<RwLock<SyncStatus>>,
}

impl StatusStore {
    pub fn new(initial: SyncStatus) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Copy of the current record
    pub async fn snapshot(&self) -> SyncStatus {
        self.inner.read().await.clone()
    }

    pub async fn set_running(&self, running: bool) {
        self.inner.write().await.sync_running = running;
    }

    pub async fn set_origin(&self, status: InstanceStatus) {
        self.inner.write().await.origin = status;
    }

    /// Replace a replica's entry, matched by URL and API path
    pub async fn set_replica(&self, status: InstanceStatus) {
        let mut inner = self.inner.write().await;
        match inner
            .replicas
            .iter_mut()
            .find(|r| r.url == status.url && r.api_path == status.api_path)
        {
            Some(existing) => *existing = status,
            None => inner.replicas.push(status),
        }
    }
}
