//! The `invincible` region flag.

use warden_query::ApplicableRegionSet;
use warden_types::flags::INVINCIBILITY;
use warden_types::{FlagValue, Location, State};

use crate::error::HandlerError;
use crate::handler::{Crossing, Handler, HandlerContext};
use crate::tracker::FlagValueChangeTracker;

/// Tracks the `invincible` state at the actor's position and reports it as
/// the handler's invincibility opinion.
#[derive(Debug)]
pub struct InvincibilityHandler {
    tracker: FlagValueChangeTracker,
}

impl Default for InvincibilityHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InvincibilityHandler {
    /// An uninitialized handler.
    pub const fn new() -> Self {
        Self {
            tracker: FlagValueChangeTracker::new(&INVINCIBILITY),
        }
    }

    fn track(&mut self, ctx: &HandlerContext<'_>, set: &ApplicableRegionSet) {
        if let Some(value) = self.tracker.observe(set, ctx.subject).accepted_value() {
            self.tracker.commit(value);
        }
    }
}

impl Handler for InvincibilityHandler {
    fn name(&self) -> &'static str {
        "invincibility"
    }

    fn initialize(
        &mut self,
        ctx: &HandlerContext<'_>,
        _location: &Location,
        set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        self.tracker.initialize(set, ctx.subject);
        Ok(())
    }

    fn tick(&mut self, ctx: &HandlerContext<'_>, set: &ApplicableRegionSet) -> Result<(), HandlerError> {
        self.track(ctx, set);
        Ok(())
    }

    fn on_cross_boundary(
        &mut self,
        ctx: &HandlerContext<'_>,
        crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        self.track(ctx, crossing.to_set);
        Ok(true)
    }

    fn reset_state(&mut self) {
        self.tracker.reset();
    }

    fn invincibility(&self, ctx: &HandlerContext<'_>) -> Option<State> {
        if ctx.bypass {
            return None;
        }
        self.tracker.last().and_then(FlagValue::as_state)
    }
}
