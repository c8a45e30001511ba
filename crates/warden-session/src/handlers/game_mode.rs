//! Game mode enforcement.

use warden_query::ApplicableRegionSet;
use warden_types::flags::GAME_MODE;
use warden_types::{FlagValue, GameMode, Location};

use crate::error::HandlerError;
use crate::handler::{Crossing, Handler, HandlerContext};
use crate::tracker::FlagValueChangeTracker;

/// Puts actors into the `game-mode` of their regions and restores their
/// own mode when they leave.
///
/// The mode is only restored if the actor is still in the mode the
/// handler applied; a mode changed by other means in between is left
/// alone. Bypassing actors are never forced.
#[derive(Debug)]
pub struct GameModeHandler {
    tracker: FlagValueChangeTracker,
    original: Option<GameMode>,
    applied: Option<GameMode>,
    before_crossing: (Option<GameMode>, Option<GameMode>),
}

impl Default for GameModeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl GameModeHandler {
    /// A handler that has not changed anybody's mode.
    pub const fn new() -> Self {
        Self {
            tracker: FlagValueChangeTracker::new(&GAME_MODE),
            original: None,
            applied: None,
            before_crossing: (None, None),
        }
    }

    /// The actor's mode before the handler first changed it.
    pub const fn original(&self) -> Option<GameMode> {
        self.original
    }

    /// The mode the handler last applied.
    pub const fn applied(&self) -> Option<GameMode> {
        self.applied
    }

    fn update(
        &mut self,
        ctx: &HandlerContext<'_>,
        set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        if let Some(value) = self.tracker.observe(set, ctx.subject).accepted_value() {
            self.tracker.commit(value);
        }
        let wanted = self.tracker.last().and_then(FlagValue::as_game_mode);
        let current = ctx.actor.game_mode;

        match wanted {
            Some(mode) if !ctx.bypass => {
                if current != mode {
                    ctx.host.set_game_mode(ctx.actor.id, mode)?;
                    if self.original.is_none() {
                        self.original = Some(current);
                    }
                    self.applied = Some(mode);
                }
            }
            _ => {
                if let Some(original) = self.original {
                    if self.applied == Some(current) {
                        ctx.host.set_game_mode(ctx.actor.id, original)?;
                    }
                    self.original = None;
                    self.applied = None;
                }
            }
        }
        Ok(())
    }
}

impl Handler for GameModeHandler {
    fn name(&self) -> &'static str {
        "game-mode"
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
        self.update(ctx, set)
    }

    fn on_cross_boundary(
        &mut self,
        ctx: &HandlerContext<'_>,
        crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        self.before_crossing = (self.original, self.applied);
        self.update(ctx, crossing.to_set)?;
        Ok(true)
    }

    fn on_crossing_rejected(
        &mut self,
        ctx: &HandlerContext<'_>,
        _location: &Location,
        set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        self.tracker.initialize(set, ctx.subject);
        (self.original, self.applied) = self.before_crossing;
        Ok(())
    }

    fn reset_state(&mut self) {
        self.tracker.reset();
        self.original = None;
        self.applied = None;
        self.before_crossing = (None, None);
    }
}
