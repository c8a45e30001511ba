//! Administrative water breathing.

use warden_query::ApplicableRegionSet;

use crate::error::HandlerError;
use crate::handler::{Handler, HandlerContext};

/// Refills the actor's air every tick while enabled.
#[derive(Debug, Default)]
pub struct WaterBreathingHandler {
    enabled: bool,
}

impl WaterBreathingHandler {
    /// A disabled handler.
    pub const fn new() -> Self {
        Self { enabled: false }
    }

    /// Turn water breathing on or off.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether water breathing is on.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Handler for WaterBreathingHandler {
    fn name(&self) -> &'static str {
        "water-breathing"
    }

    fn tick(&mut self, ctx: &HandlerContext<'_>, _set: &ApplicableRegionSet) -> Result<(), HandlerError> {
        let actor = ctx.actor;
        if self.enabled && actor.remaining_air < actor.max_air {
            ctx.host.set_remaining_air(actor.id, actor.max_air)?;
        }
        Ok(())
    }
}
