//! DHCP server config and static leases

use super::{ActionContext, log_changes};
use crate::error::Result;
use crate::merge::merge;
use crate::model::StaticLease;
use crate::registry::SyncAction;
use crate::snapshot::required;
use tracing::debug;

/// Skipped when the origin has no complete address family configured
pub(super) async fn sync_server_config(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::DhcpServerConfig;
    let origin = required(&ctx.origin.dhcp, "DHCP status")?;
    if !origin.has_config() {
        debug!("{}: origin has no complete DHCP config, skipping", action);
        return Ok(());
    }

    let desired = origin.server_config().with_overrides(
        ctx.replica.interface_name.as_deref(),
        ctx.replica.dhcp_server_enabled,
    );
    let current = ctx.client.dhcp_status().await?.server_config();
    if current.matches(&desired) {
        log_changes(action, &[]);
        return Ok(());
    }

    ctx.client.set_dhcp_config(&desired).await?;
    log_changes(
        action,
        &[format!(
            "interface={} enabled={}",
            desired.interface_name.as_deref().unwrap_or("-"),
            desired.enabled.unwrap_or(false)
        )],
    );
    Ok(())
}

/// Changed leases are replaced: the old lease is removed with the stale
/// ones before the new one is added
pub(super) async fn sync_static_leases(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::DhcpStaticLeases;
    let origin = required(&ctx.origin.dhcp, "DHCP status")?;
    let replica = ctx.client.dhcp_status().await?;

    let result = merge(&replica.static_leases, &origin.static_leases);

    let replaced = replica.static_leases.iter().filter(|lease| {
        result
            .updates
            .iter()
            .any(|u| u.mac.eq_ignore_ascii_case(&lease.mac))
    });

    // Replica duplicates of a changed lease are already in deletes
    let mut stale: Vec<&StaticLease> = Vec::new();
    for lease in result.deletes.iter().chain(replaced) {
        if !stale.contains(&lease) {
            stale.push(lease);
        }
    }

    let mut failures = ctx.collector(action);
    let mut changes = Vec::new();

    for lease in stale {
        let outcome = ctx.client.delete_dhcp_static_lease(lease).await;
        if failures.check(format!("delete lease {}", lease.mac), outcome)? {
            changes.push(format!("deleted {}", lease.mac));
        }
    }
    for lease in result.adds.iter().chain(&result.updates) {
        let outcome = ctx.client.add_dhcp_static_lease(lease).await;
        if failures.check(format!("add lease {}", lease.mac), outcome)? {
            changes.push(format!("added {} -> {}", lease.mac, lease.ip));
        }
    }

    log_changes(action, &changes);
    failures.finish()
}
