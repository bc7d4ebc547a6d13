//! Whole-object settings: query log, statistics, blocked services, TLS

use super::{ActionContext, log_changes};
use crate::error::Result;
use crate::registry::SyncAction;
use crate::snapshot::required;

pub(super) async fn sync_query_log_config(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::QueryLogConfig;
    let origin = required(&ctx.origin.query_log_config, "query log config")?;

    if ctx.client.query_log_config().await?.matches(origin) {
        log_changes(action, &[]);
        return Ok(());
    }

    ctx.client.set_query_log_config(origin).await?;
    log_changes(action, &["updated".to_string()]);
    Ok(())
}

pub(super) async fn sync_stats_config(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::StatsConfig;
    let origin = required(&ctx.origin.stats_config, "stats config")?;

    if ctx.client.stats_config().await?.matches(origin) {
        log_changes(action, &[]);
        return Ok(());
    }

    ctx.client.set_stats_config(origin).await?;
    log_changes(action, &["updated".to_string()]);
    Ok(())
}

pub(super) async fn sync_blocked_services_schedule(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::BlockedServicesSchedule;
    let origin = required(
        &ctx.origin.blocked_services_schedule,
        "blocked services schedule",
    )?;

    if ctx.client.blocked_services_schedule().await?.matches(origin) {
        log_changes(action, &[]);
        return Ok(());
    }

    ctx.client.set_blocked_services_schedule(origin).await?;
    log_changes(action, &[format!("{} blocked service(s)", origin.ids.len())]);
    Ok(())
}

pub(super) async fn sync_tls_config(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::TlsConfig;
    let origin = required(&ctx.origin.tls_config, "TLS config")?;

    if ctx.client.tls_config().await?.matches(origin) {
        log_changes(action, &[]);
        return Ok(());
    }

    ctx.client.set_tls_config(origin).await?;
    log_changes(action, &["updated".to_string()]);
    Ok(())
}
