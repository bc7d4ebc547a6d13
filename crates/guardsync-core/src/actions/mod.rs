//! Sync actions
//!
//! One action per resource type. Every action follows the same shape:
//!
//! 1. Read the replica's current state for its resource type
//! 2. Compare it against the origin snapshot
//! 3. Issue only the writes needed to converge
//!
//! A failed read aborts the action. Failed item writes follow the
//! continue-on-error policy: when enabled, the failure is logged, the loop
//! moves on, and the action reports every failed item at the end as
//! [`Error::ItemFailures`]. Otherwise the first failure aborts the action.

mod clients;
mod dhcp;
mod dns;
mod filters;
mod general;
mod settings;

use crate::config::{Features, InstanceConfig};
use crate::error::{Error, Result};
use crate::model::ServerStatus;
use crate::registry::SyncAction;
use crate::snapshot::OriginSnapshot;
use crate::traits::ApplianceClient;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Everything an action needs to sync one replica
pub struct ActionContext<'a> {
    /// Replica descriptor
    pub replica: &'a InstanceConfig,
    /// Client for the replica
    pub client: &'a dyn ApplianceClient,
    /// Origin state for this pass
    pub origin: &'a OriginSnapshot,
    /// Enabled resource types
    pub features: &'a Features,
    /// Keep going after a failed item write
    pub continue_on_error: bool,
    /// Replica status read before the actions ran
    pub replica_status: &'a ServerStatus,
}

impl ActionContext<'_> {
    fn collector(&self, action: SyncAction) -> FailureCollector {
        FailureCollector {
            action,
            continue_on_error: self.continue_on_error,
            failures: Vec::new(),
        }
    }
}

impl SyncAction {
    /// Run this action against one replica
    pub async fn run(self, ctx: &ActionContext<'_>) -> Result<()> {
        match self {
            Self::GeneralSettings => general::sync_general_settings(ctx).await,
            Self::DnsServerConfig => dns::sync_server_config(ctx).await,
            Self::QueryLogConfig => settings::sync_query_log_config(ctx).await,
            Self::StatsConfig => settings::sync_stats_config(ctx).await,
            Self::DnsRewrites => dns::sync_rewrites(ctx).await,
            Self::Filters => filters::sync_filters(ctx).await,
            Self::BlockedServicesSchedule => settings::sync_blocked_services_schedule(ctx).await,
            Self::ClientSettings => clients::sync_clients(ctx).await,
            Self::DnsAccessLists => dns::sync_access_lists(ctx).await,
            Self::DhcpServerConfig => dhcp::sync_server_config(ctx).await,
            Self::DhcpStaticLeases => dhcp::sync_static_leases(ctx).await,
            Self::TlsConfig => settings::sync_tls_config(ctx).await,
        }
    }
}

/// Applies the continue-on-error policy to item writes
struct FailureCollector {
    action: SyncAction,
    continue_on_error: bool,
    failures: Vec<String>,
}

impl FailureCollector {
    /// Record the outcome of one write
    ///
    /// Returns the error when continue-on-error is off, so `?` aborts the action.
    fn check(&mut self, item: impl Display, result: Result<()>) -> Result<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(e) if self.continue_on_error => {
                warn!("{}: {} failed: {}", self.action, item, e);
                self.failures.push(format!("{item}: {e}"));
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Report every recorded failure
    fn finish(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(Error::ItemFailures {
                action: self.action.name(),
                failures: self.failures,
            })
        }
    }
}

/// Log the one-line summary of what an action changed
fn log_changes(action: SyncAction, changes: &[String]) {
    if changes.is_empty() {
        debug!("{}: in sync", action);
    } else {
        info!("{}: {}", action, changes.join(", "));
    }
}
