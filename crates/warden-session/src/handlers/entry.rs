//! Entry restriction.

use chrono::{DateTime, TimeDelta, Utc};
use warden_types::FlagValue;
use warden_types::flags::{ENTRY, ENTRY_DENY_MESSAGE};

use crate::error::HandlerError;
use crate::handler::{Crossing, Handler, HandlerContext};

/// Minimum time between two deny messages.
pub const MESSAGE_COOLDOWN: TimeDelta = TimeDelta::seconds(1);

/// Send a deny message unless one was sent within [`MESSAGE_COOLDOWN`].
pub(crate) fn send_throttled(
    ctx: &HandlerContext<'_>,
    last_message: &mut Option<DateTime<Utc>>,
    message: Option<&str>,
) -> Result<(), HandlerError> {
    let Some(message) = message.filter(|m| !m.is_empty()) else {
        return Ok(());
    };
    let cooled =
        last_message.is_none_or(|last| ctx.now.signed_duration_since(last) > MESSAGE_COOLDOWN);
    if cooled {
        ctx.send_message(message)?;
        *last_message = Some(ctx.now);
    }
    Ok(())
}

/// Vetoes moves into places where `entry` is not allowed for the actor.
#[derive(Debug, Default)]
pub struct EntryHandler {
    last_message: Option<DateTime<Utc>>,
}

impl EntryHandler {
    /// A handler that has not sent any message yet.
    pub const fn new() -> Self {
        Self { last_message: None }
    }
}

impl Handler for EntryHandler {
    fn name(&self) -> &'static str {
        "entry"
    }

    fn on_cross_boundary(
        &mut self,
        ctx: &HandlerContext<'_>,
        crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        if ctx.bypass || !crossing.move_type.is_cancellable() {
            return Ok(true);
        }
        if crossing.to_set.test_state(ctx.subject, &[&ENTRY]) {
            return Ok(true);
        }

        let message = crossing.to_set.query_value(ctx.subject, &ENTRY_DENY_MESSAGE);
        send_throttled(ctx, &mut self.last_message, message.as_ref().and_then(FlagValue::as_text))?;
        Ok(false)
    }

    fn reset_state(&mut self) {
        self.last_message = None;
    }
}
