//! General settings: profile, protection, parental control, safe search,
//! safe browsing

use super::{ActionContext, log_changes};
use crate::error::Result;
use crate::registry::SyncAction;
use crate::snapshot::required;

pub(super) async fn sync_general_settings(ctx: &ActionContext<'_>) -> Result<()> {
    let action = SyncAction::GeneralSettings;
    let mut failures = ctx.collector(action);
    let mut changes = Vec::new();

    let origin_profile = required(&ctx.origin.profile, "profile")?;
    let profile = ctx.client.profile_info().await?;
    if let Some(merged) = profile.should_sync_for(origin_profile, ctx.features.theme) {
        if failures.check("set profile", ctx.client.set_profile_info(&merged).await)? {
            changes.push(format!("profile language={} theme={}", merged.language, merged.theme));
        }
    }

    let protection = ctx.origin.status.protection_enabled;
    if ctx.replica_status.protection_enabled != protection
        && failures.check("toggle protection", ctx.client.toggle_protection(protection).await)?
    {
        changes.push(format!("protection={protection}"));
    }

    let parental = *required(&ctx.origin.parental, "parental control")?;
    if ctx.client.parental().await? != parental
        && failures.check("toggle parental", ctx.client.toggle_parental(parental).await)?
    {
        changes.push(format!("parental={parental}"));
    }

    let safe_search = required(&ctx.origin.safe_search, "safe search config")?;
    if !ctx.client.safe_search_config().await?.matches(safe_search)
        && failures.check(
            "set safe search",
            ctx.client.set_safe_search_config(safe_search).await,
        )?
    {
        changes.push("safe search".to_string());
    }

    let safe_browsing = *required(&ctx.origin.safe_browsing, "safe browsing")?;
    if ctx.client.safe_browsing().await? != safe_browsing
        && failures.check(
            "toggle safe browsing",
            ctx.client.toggle_safe_browsing(safe_browsing).await,
        )?
    {
        changes.push(format!("safe browsing={safe_browsing}"));
    }

    log_changes(action, &changes);
    failures.finish()
}
