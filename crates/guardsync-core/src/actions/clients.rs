//! Persistent client settings

use super::{ActionContext, log_changes};
use crate::error::Result;
use crate::merge::merge;
use crate::registry::SyncAction;
use crate::snapshot::required;
use tracing::warn;

/// Deletes run first so a renamed client never collides with its old ids
pub(super) async fn sync_clients(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::ClientSettings;
    let origin = required(&ctx.origin.clients, "clients")?;
    let replica = ctx.client.clients().await?;

    let result = merge(&replica.clients, &origin.clients);
    for duplicate in &result.duplicates {
        warn!("Origin has duplicate client {}, syncing it once", duplicate.name);
    }

    let mut failures = ctx.collector(action);
    let mut changes = Vec::new();

    for client in &result.deletes {
        let outcome = ctx.client.delete_client(client).await;
        if failures.check(format!("delete client {}", client.name), outcome)? {
            changes.push(format!("deleted {}", client.name));
        }
    }
    for client in &result.adds {
        let outcome = ctx.client.add_client(client).await;
        if failures.check(format!("add client {}", client.name), outcome)? {
            changes.push(format!("added {}", client.name));
        }
    }
    for client in &result.updates {
        let outcome = ctx.client.update_client(client).await;
        if failures.check(format!("update client {}", client.name), outcome)? {
            changes.push(format!("updated {}", client.name));
        }
    }

    log_changes(action, &changes);
    failures.finish()
}
