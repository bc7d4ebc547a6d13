//! Sync engine
//!
//! The SyncEngine is responsible for:
//! - Guarding against overlapping passes
//! - Reading the origin snapshot once per pass
//! - Running the action list against every replica
//! - Recording per-instance outcomes in the status store
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!   run_sync() ────▶ │  SyncEngine  │
//!                    └──────────────┘
//!                           │
//!         ┌─────────────────┼─────────────────────┐
//!         │                 │                     │
//!         ▼                 ▼                     ▼
//! ┌──────────────┐  ┌──────────────┐      ┌─────────────┐
//! │ Origin       │  │ Replica 1..n │      │ StatusStore │
//! │ (snapshot)   │  │ (actions)    │      │ + Events    │
//! └──────────────┘  └──────────────┘      └─────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Acquire the run guard, or reject the pass
//! 2. Read origin status, check its version, fetch the snapshot
//! 3. For each replica (sorted by key): read status, auto-setup if needed,
//!    check version, run every action in order
//! 4. Publish status and return the pass report

use crate::actions::ActionContext;
use crate::config::{Features, InstanceConfig, SyncConfig};
use crate::error::{Error, Result};
use crate::model::ServerStatus;
use crate::registry::{SyncAction, build_actions};
use crate::snapshot::OriginSnapshot;
use crate::status::{InstanceStatus, StatusStore, SyncState, SyncStatus};
use crate::traits::{ApplianceClient, ClientFactory};
use crate::version;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Pass started
    PassStarted { replicas: usize },

    /// Pass rejected because another one is running
    PassRejected,

    /// An action failed on a replica
    ActionFailed {
        host: String,
        action: SyncAction,
        error: String,
    },

    /// A replica finished
    ReplicaFinished { host: String, state: SyncState },

    /// Pass finished
    PassFinished { outcome: PassOutcome },
}

/// Aggregate outcome of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// Every replica succeeded
    Success,
    /// Some replicas failed or had errors
    PartialFailure,
    /// The origin was unusable or every replica failed
    Failure,
}

/// Result of one replica in a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaReport {
    pub host: String,
    pub state: SyncState,
    /// One entry per failed action or precondition
    pub errors: Vec<String>,
}

/// Result of a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub outcome: PassOutcome,
    pub replicas: Vec<ReplicaReport>,
}

/// Core sync engine
///
/// The engine owns the run guard and the status record. Share it between
/// a scheduler and API handlers with an `Arc`; at most one pass runs at a
/// time per engine.
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Call [`SyncEngine::run_sync()`] on every trigger
/// 3. Read [`SyncEngine::status()`] / [`SyncEngine::is_healthy()`] any time
pub struct SyncEngine {
    /// Builds clients for the origin and replicas
    factory: Arc<dyn ClientFactory>,

    origin: InstanceConfig,

    /// De-duplicated, sorted replicas
    replicas: Vec<InstanceConfig>,

    features: Features,

    continue_on_error: bool,

    /// Set while a pass runs
    running: AtomicBool,

    status: StatusStore,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

/// Releases the run guard when the pass ends, however it ends
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        config: SyncConfig,
        factory: Arc<dyn ClientFactory>,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);
        let replicas = config.unique_replicas();
        let status = StatusStore::new(SyncStatus::pending(&config.origin, &replicas));

        let engine = Self {
            factory,
            origin: config.origin,
            replicas,
            features: config.features,
            continue_on_error: config.continue_on_error,
            running: AtomicBool::new(false),
            status,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Whether a pass is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Copy of the current status record
    pub async fn status(&self) -> SyncStatus {
        self.status.snapshot().await
    }

    /// Whether the last pass left every instance healthy
    pub async fn is_healthy(&self) -> bool {
        self.status.snapshot().await.is_healthy()
    }

    /// Replicas this engine syncs, in pass order
    pub fn replicas(&self) -> &[InstanceConfig] {
        &self.replicas
    }

    /// Run one sync pass
    ///
    /// # Returns
    ///
    /// - `Ok(PassReport)`: The pass ran; replica failures are in the report
    /// - `Err(Error::SyncInProgress)`: Another pass holds the run guard
    /// - `Err(Error)`: The origin could not be read or is unsupported
    pub async fn run_sync(&self) -> Result<PassReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Sync already running, skipping this trigger");
            self.emit_event(SyncEvent::PassRejected);
            return Err(Error::SyncInProgress);
        }
        let _guard = RunGuard {
            running: &self.running,
        };

        self.status.set_running(true).await;
        self.emit_event(SyncEvent::PassStarted {
            replicas: self.replicas.len(),
        });

        let result = self.run_pass().await;

        self.status.set_running(false).await;
        let outcome = match &result {
            Ok(report) => report.outcome,
            Err(_) => PassOutcome::Failure,
        };
        self.emit_event(SyncEvent::PassFinished { outcome });
        result
    }

    async fn run_pass(&self) -> Result<PassReport> {
        let mut origin_status = InstanceStatus::pending(&self.origin);
        origin_status.last_sync = Some(chrono::Utc::now());

        let fetched = match self.factory.create(&self.origin) {
            Ok(client) => self.fetch_origin(client.as_ref()).await,
            Err(e) => Err(e),
        };
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Origin {} unusable: {}", self.origin.host(), e);
                origin_status.state = SyncState::Failure;
                origin_status.error = Some(e.to_string());
                self.status.set_origin(origin_status).await;
                return Err(e);
            }
        };

        origin_status.state = SyncState::Success;
        origin_status.reachable = true;
        origin_status.version = Some(snapshot.status.version.clone());
        origin_status.protection_enabled = Some(snapshot.status.protection_enabled);
        self.status.set_origin(origin_status).await;

        let actions = build_actions(&self.features);
        info!(
            "Syncing {} replica(s) from {} ({}), {} action(s)",
            self.replicas.len(),
            self.origin.host(),
            snapshot.status.version,
            actions.len()
        );

        let mut reports = Vec::with_capacity(self.replicas.len());
        for replica in &self.replicas {
            let span = info_span!("replica", host = %replica.host());
            let report = self
                .sync_replica(replica, &snapshot, &actions)
                .instrument(span)
                .await;
            reports.push(report);
        }

        let outcome = pass_outcome(&reports);
        match outcome {
            PassOutcome::Success => info!("Sync pass finished successfully"),
            _ => warn!("Sync pass finished with outcome {:?}", outcome),
        }

        Ok(PassReport {
            outcome,
            replicas: reports,
        })
    }

    /// Read origin status, check its version, fetch the snapshot
    async fn fetch_origin(&self, client: &dyn ApplianceClient) -> Result<OriginSnapshot> {
        let status = client.status().await?;
        if !version::is_supported(&status.version) {
            return Err(Error::unsupported_version(
                client.host(),
                &status.version,
                version::MIN_VERSION,
            ));
        }
        OriginSnapshot::fetch(client, status, &self.features).await
    }

    async fn sync_replica(
        &self,
        replica: &InstanceConfig,
        snapshot: &OriginSnapshot,
        actions: &[SyncAction],
    ) -> ReplicaReport {
        let mut status = InstanceStatus::pending(replica);
        status.last_sync = Some(chrono::Utc::now());

        let mut errors = Vec::new();
        let state = match self.prepare_replica(replica, snapshot).await {
            Err(e) => {
                error!("Replica {} not synced: {}", replica.host(), e);
                errors.push(e.to_string());
                SyncState::Failure
            }
            Ok((client, replica_status)) => {
                status.reachable = true;
                status.version = Some(replica_status.version.clone());
                status.protection_enabled = Some(replica_status.protection_enabled);

                let ctx = ActionContext {
                    replica,
                    client: client.as_ref(),
                    origin: snapshot,
                    features: &self.features,
                    continue_on_error: self.continue_on_error,
                    replica_status: &replica_status,
                };
                self.run_actions(&ctx, actions, &mut errors).await
            }
        };

        status.state = state;
        status.error = (!errors.is_empty()).then(|| errors.join("; "));
        self.status.set_replica(status).await;

        match state {
            SyncState::Success => info!("Replica {} in sync", replica.host()),
            _ => warn!("Replica {} finished with {:?}", replica.host(), state),
        }
        self.emit_event(SyncEvent::ReplicaFinished {
            host: replica.host().to_string(),
            state,
        });

        ReplicaReport {
            host: replica.host().to_string(),
            state,
            errors,
        }
    }

    /// Build the replica client and check its preconditions
    async fn prepare_replica(
        &self,
        replica: &InstanceConfig,
        snapshot: &OriginSnapshot,
    ) -> Result<(Box<dyn ApplianceClient>, ServerStatus)> {
        let client = self.factory.create(replica)?;
        let status = status_with_setup(client.as_ref(), replica).await?;

        if !version::is_supported(&status.version) {
            return Err(Error::unsupported_version(
                replica.host(),
                &status.version,
                version::MIN_VERSION,
            ));
        }
        if !version::same(&snapshot.status.version, &status.version) {
            return Err(Error::version_mismatch(
                &snapshot.status.version,
                &status.version,
            ));
        }

        debug!("Replica {} runs {}", replica.host(), status.version);
        Ok((client, status))
    }

    /// Run actions in order, collecting errors
    ///
    /// Stops at the first failed action unless continue-on-error is set.
    async fn run_actions(
        &self,
        ctx: &ActionContext<'_>,
        actions: &[SyncAction],
        errors: &mut Vec<String>,
    ) -> SyncState {
        for action in actions {
            if let Err(e) = action.run(ctx).await {
                error!("Action {} failed on {}: {}", action, ctx.replica.host(), e);
                self.emit_event(SyncEvent::ActionFailed {
                    host: ctx.replica.host().to_string(),
                    action: *action,
                    error: e.to_string(),
                });
                errors.push(format!("{action}: {e}"));

                if !self.continue_on_error {
                    return SyncState::Failure;
                }
            }
        }

        if errors.is_empty() {
            SyncState::Success
        } else {
            SyncState::PartialFailure
        }
    }

    /// Emit an engine event
    fn emit_event(&self, event: SyncEvent) {
        // Send event, logging warning if channel is full (backpressure)
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Read a replica's status, running the initial setup first if the replica
/// asks for it and auto setup is enabled
async fn status_with_setup(
    client: &dyn ApplianceClient,
    replica: &InstanceConfig,
) -> Result<ServerStatus> {
    match client.status().await {
        Err(e) if e.is_setup_needed() && replica.auto_setup => {
            info!("Running initial setup on {}", replica.host());
            client.setup().await?;
            client.status().await
        }
        other => other,
    }
}

fn pass_outcome(reports: &[ReplicaReport]) -> PassOutcome {
    if reports.iter().all(|r| r.state == SyncState::Success) {
        PassOutcome::Success
    } else if reports.iter().all(|r| r.state == SyncState::Failure) {
        PassOutcome::Failure
    } else {
        PassOutcome::PartialFailure
    }
}
