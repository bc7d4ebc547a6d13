//! Filter lists, custom rules, filtering toggle

use super::{ActionContext, FailureCollector, log_changes};
use crate::error::Result;
use crate::merge::merge;
use crate::model::{Filter, FilterKind};
use crate::registry::SyncAction;
use crate::snapshot::required;
use crate::traits::ApplianceClient;
use tracing::warn;

pub(super) async fn sync_filters(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::Filters;
    let origin = required(&ctx.origin.filters, "filtering status")?;
    let replica = ctx.client.filtering().await?;

    let mut failures = ctx.collector(action);
    let mut changes = Vec::new();

    for kind in [FilterKind::Blocklist, FilterKind::Allowlist] {
        sync_list(
            ctx.client,
            kind,
            replica.list(kind),
            origin.list(kind),
            &mut failures,
            &mut changes,
        )
        .await?;
    }

    if origin.user_rules != replica.user_rules {
        let outcome = ctx.client.set_custom_rules(&origin.user_rules).await;
        if failures.check("set custom rules", outcome)? {
            changes.push(format!("{} custom rule(s)", origin.user_rules.len()));
        }
    }

    if origin.enabled != replica.enabled || origin.interval != replica.interval {
        let outcome = ctx
            .client
            .toggle_filtering(origin.enabled, origin.interval)
            .await;
        if failures.check("toggle filtering", outcome)? {
            changes.push(format!(
                "filtering enabled={} interval={}h",
                origin.enabled, origin.interval
            ));
        }
    }

    log_changes(action, &changes);
    failures.finish()
}

/// Reconcile one filter collection
///
/// The collection is refreshed once when at least one add or update was
/// issued. Duplicates on the origin never cause a write or a refresh.
async fn sync_list(
    client: &dyn ApplianceClient,
    kind: FilterKind,
    replica: &[Filter],
    origin: &[Filter],
    failures: &mut FailureCollector,
    changes: &mut Vec<String>,
) -> Result<()> {
    let result = merge(replica, origin);
    for duplicate in &result.duplicates {
        warn!("Origin has duplicate {} {}, syncing it once", kind, duplicate.url);
    }

    let mut deleted = 0;
    for filter in &result.deletes {
        let outcome = client.delete_filter(kind, filter).await;
        if failures.check(format!("delete {} {}", kind, filter.url), outcome)? {
            deleted += 1;
        }
    }

    let mut added = 0;
    for filter in &result.adds {
        let outcome = client.add_filter(kind, filter).await;
        if failures.check(format!("add {} {}", kind, filter.url), outcome)? {
            added += 1;
        }
    }

    let mut updated = 0;
    for filter in &result.updates {
        let outcome = client.update_filter(kind, filter).await;
        if failures.check(format!("update {} {}", kind, filter.url), outcome)? {
            updated += 1;
        }
    }

    if !result.adds.is_empty() || !result.updates.is_empty() {
        let outcome = client.refresh_filters(kind).await;
        failures.check(format!("refresh {kind}"), outcome)?;
    }

    if deleted + added + updated > 0 {
        changes.push(format!(
            "{kind}: {added} added, {updated} updated, {deleted} deleted"
        ));
    }
    Ok(())
}
