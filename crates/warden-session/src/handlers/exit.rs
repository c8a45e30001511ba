//! Exit restriction.

use chrono::{DateTime, Utc};
use warden_query::ApplicableRegionSet;
use warden_types::flags::{EXIT, EXIT_DENY_MESSAGE, EXIT_OVERRIDE, EXIT_VIA_TELEPORT};
use warden_types::{FlagValue, Location, State};

use crate::error::HandlerError;
use crate::handler::{Crossing, Handler, HandlerContext};
use crate::handlers::entry::send_throttled;
use crate::tracker::FlagValueChangeTracker;

/// Settings of the place the actor is leaving, captured when the actor
/// arrived there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OriginSettings {
    via_teleport: bool,
    exit_override: bool,
    deny_message: Option<String>,
}

/// Vetoes moves out of places where `exit` is denied for the actor.
///
/// The veto only fires when the `exit` value changes across the move, so
/// moving between sub-areas of a no-exit zone is free. Leaving by teleport
/// is allowed when the origin permits `exit-via-teleport`, and
/// `exit-override` at the origin always allows leaving.
#[derive(Debug)]
pub struct ExitHandler {
    tracker: FlagValueChangeTracker,
    origin: OriginSettings,
    last_message: Option<DateTime<Utc>>,
}

impl Default for ExitHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitHandler {
    /// A handler with no recorded origin.
    pub const fn new() -> Self {
        Self {
            tracker: FlagValueChangeTracker::new(&EXIT),
            origin: OriginSettings {
                via_teleport: false,
                exit_override: false,
                deny_message: None,
            },
            last_message: None,
        }
    }

    fn capture(&mut self, ctx: &HandlerContext<'_>, set: &ApplicableRegionSet) {
        self.origin = OriginSettings {
            via_teleport: set.test_state(ctx.subject, &[&EXIT_VIA_TELEPORT]),
            exit_override: set
                .query_value(ctx.subject, &EXIT_OVERRIDE)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            deny_message: set
                .query_value(ctx.subject, &EXIT_DENY_MESSAGE)
                .and_then(|v| v.as_text().map(str::to_owned)),
        };
    }
}

impl Handler for ExitHandler {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn initialize(
        &mut self,
        ctx: &HandlerContext<'_>,
        _location: &Location,
        set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        self.tracker.initialize(set, ctx.subject);
        self.capture(ctx, set);
        Ok(())
    }

    fn on_cross_boundary(
        &mut self,
        ctx: &HandlerContext<'_>,
        crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        let change = self.tracker.observe(crossing.to_set, ctx.subject);
        let Some(accepted) = change.accepted_value() else {
            self.capture(ctx, crossing.to_set);
            return Ok(true);
        };

        let leaving_denied = change.last().and_then(FlagValue::as_state) == Some(State::Deny);
        let allowed = ctx.bypass
            || !leaving_denied
            || self.origin.exit_override
            || (crossing.move_type.is_teleport() && self.origin.via_teleport);

        if !allowed && crossing.move_type.is_cancellable() {
            let message = self.origin.deny_message.clone();
            send_throttled(ctx, &mut self.last_message, message.as_deref())?;
            return Ok(false);
        }

        self.tracker.commit(accepted);
        self.capture(ctx, crossing.to_set);
        Ok(true)
    }

    fn reset_state(&mut self) {
        self.tracker.reset();
        self.origin = OriginSettings::default();
        self.last_message = None;
    }
}
