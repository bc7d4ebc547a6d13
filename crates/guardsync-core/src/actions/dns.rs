//! DNS server config, rewrites, access lists

use super::{ActionContext, log_changes};
use crate::error::Result;
use crate::merge::merge;
use crate::registry::SyncAction;
use crate::snapshot::required;
use tracing::warn;

pub(super) async fn sync_server_config(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::DnsServerConfig;
    let origin = required(&ctx.origin.dns_config, "DNS config")?.sanitized();

    let replica = ctx.client.dns_config().await?;
    if replica.matches(&origin) {
        log_changes(action, &[]);
        return Ok(());
    }

    ctx.client.set_dns_config(&origin).await?;
    log_changes(action, &["updated".to_string()]);
    Ok(())
}

/// Stale entries are deleted before new ones are added
pub(super) async fn sync_rewrites(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::DnsRewrites;
    let origin = required(&ctx.origin.rewrites, "DNS rewrites")?;
    let replica = ctx.client.rewrite_list().await?;

    let result = merge(&replica, origin);
    for duplicate in &result.duplicates {
        warn!(
            "Origin has duplicate DNS rewrite {} -> {}, syncing it once",
            duplicate.domain, duplicate.answer
        );
    }

    let mut failures = ctx.collector(action);
    let mut deleted = 0;
    for entry in &result.deletes {
        let outcome = ctx.client.delete_rewrite_entry(entry).await;
        if failures.check(format!("delete {}", entry.key()), outcome)? {
            deleted += 1;
        }
    }

    let mut added = 0;
    for entry in &result.adds {
        let outcome = ctx.client.add_rewrite_entry(entry).await;
        if failures.check(format!("add {}", entry.key()), outcome)? {
            added += 1;
        }
    }

    let mut changes = Vec::new();
    if deleted > 0 {
        changes.push(format!("{deleted} deleted"));
    }
    if added > 0 {
        changes.push(format!("{added} added"));
    }
    log_changes(action, &changes);
    failures.finish()
}

pub(super) async fn sync_access_lists(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::DnsAccessLists;
    let origin = required(&ctx.origin.access_list, "access list")?;

    let replica = ctx.client.access_list().await?;
    if replica.matches(origin) {
        log_changes(action, &[]);
        return Ok(());
    }

    ctx.client.set_access_list(origin).await?;
    log_changes(action, &["updated".to_string()]);
    Ok(())
}
