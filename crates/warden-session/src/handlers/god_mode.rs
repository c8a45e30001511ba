//! Administrative god mode.

use warden_query::ApplicableRegionSet;
use warden_types::State;

use crate::error::HandlerError;
use crate::handler::{Handler, HandlerContext};

/// Makes the actor invincible and keeps their health full while enabled.
///
/// The toggle is set by administrators, not by regions, and survives
/// [`Handler::reset_state`].
#[derive(Debug, Default)]
pub struct GodModeHandler {
    enabled: bool,
}

impl GodModeHandler {
    /// A disabled handler.
    pub const fn new() -> Self {
        Self { enabled: false }
    }

    /// Turn god mode on or off.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether god mode is on.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Handler for GodModeHandler {
    fn name(&self) -> &'static str {
        "god-mode"
    }

    fn tick(&mut self, ctx: &HandlerContext<'_>, _set: &ApplicableRegionSet) -> Result<(), HandlerError> {
        let actor = ctx.actor;
        if self.enabled && !actor.is_dead() && actor.health < actor.max_health {
            ctx.host.set_health(actor.id, actor.max_health)?;
        }
        Ok(())
    }

    fn invincibility(&self, _ctx: &HandlerContext<'_>) -> Option<State> {
        self.enabled.then_some(State::Allow)
    }
}
