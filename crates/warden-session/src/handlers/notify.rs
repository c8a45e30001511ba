//! Staff notifications when actors enter or leave watched regions.

use std::sync::Arc;

use tracing::debug;
use warden_query::calculator::effective_value;
use warden_regions::permission::PERMISSION_PREFIX;
use warden_regions::{Region, check_permission};
use warden_types::{Flag, FlagValue};
use warden_types::flags::{NOTIFY_ENTER, NOTIFY_LEAVE};

use crate::error::HandlerError;
use crate::handler::{Crossing, Handler, HandlerContext};

/// Permission required to receive notifications.
pub fn notify_permission() -> String {
    format!("{PERMISSION_PREFIX}.notify")
}

/// Ids of the regions whose `flag` is true for the crossing actor.
fn watched(ctx: &HandlerContext<'_>, regions: &[Arc<Region>], flag: &Flag) -> Vec<String> {
    regions
        .iter()
        .filter(|r| effective_value(r, flag, ctx.subject).and_then(FlagValue::as_bool) == Some(true))
        .map(|r| r.display_id().to_owned())
        .collect()
}

/// Send `message` to every online actor holding the notify permission.
fn broadcast(ctx: &HandlerContext<'_>, message: &str) -> Result<(), HandlerError> {
    let permission = notify_permission();
    let mut sent = 0_usize;
    for recipient in ctx.host.online_actors() {
        if check_permission(ctx.authorizer, recipient, &permission) {
            ctx.host.send_message(recipient, message)?;
            sent = sent.saturating_add(1);
        }
    }
    debug!(actor = %ctx.actor.id, recipients = sent, message, "region notification");
    Ok(())
}

/// Notifies staff when an actor enters a region with `notify-enter`.
#[derive(Debug, Default)]
pub struct NotifyEntryHandler;

impl Handler for NotifyEntryHandler {
    fn name(&self) -> &'static str {
        "notify-entry"
    }

    fn on_cross_boundary(
        &mut self,
        ctx: &HandlerContext<'_>,
        crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        let ids = watched(ctx, crossing.entered, &NOTIFY_ENTER);
        if !ids.is_empty() {
            let message = format!("{} entered NOTIFY region: {}", ctx.actor.name, ids.join(", "));
            broadcast(ctx, &message)?;
        }
        Ok(true)
    }
}

/// Notifies staff when an actor leaves a region with `notify-leave`.
#[derive(Debug, Default)]
pub struct NotifyExitHandler;

impl Handler for NotifyExitHandler {
    fn name(&self) -> &'static str {
        "notify-exit"
    }

    fn on_cross_boundary(
        &mut self,
        ctx: &HandlerContext<'_>,
        crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        let ids = watched(ctx, crossing.exited, &NOTIFY_LEAVE);
        if !ids.is_empty() {
            let message = format!("{} left NOTIFY region: {}", ctx.actor.name, ids.join(", "));
            broadcast(ctx, &message)?;
        }
        Ok(true)
    }
}
