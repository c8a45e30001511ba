//! One actor's session.

use std::sync::Arc;

use tracing::{debug, warn};
use warden_query::{ApplicableRegionSet, RegionQuery};
use warden_regions::Region;
use warden_types::{ActorId, Location, MoveType, State};

use crate::error::SessionError;
use crate::handler::{Crossing, Handler, HandlerContext};
use crate::host::{BufferedHost, apply_effects};

/// The verdict on a boundary crossing.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossingOutcome {
    /// The move may go ahead.
    Allowed,
    /// The move is vetoed; the host should put the actor back.
    Denied {
        /// The last location the actor was allowed to be at.
        rollback_to: Location,
    },
}

impl CrossingOutcome {
    /// Whether the move may go ahead.
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// An ordered list of handlers plus the actor's last accepted position.
///
/// Every dispatch reaches every handler in registration order. A session
/// is owned by exactly one actor and is never shared between actors.
pub struct Session {
    actor: ActorId,
    handlers: Vec<Box<dyn Handler>>,
    last_valid: Option<Location>,
    last_set: Option<ApplicableRegionSet>,
    invincible: bool,
    needs_refresh: bool,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("actor", &self.actor)
            .field("handlers", &self.handler_names())
            .field("last_valid", &self.last_valid)
            .field("invincible", &self.invincible)
            .field("needs_refresh", &self.needs_refresh)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session that has not been initialized yet.
    pub fn new(actor: ActorId, handlers: Vec<Box<dyn Handler>>) -> Self {
        Self {
            actor,
            handlers,
            last_valid: None,
            last_set: None,
            invincible: false,
            needs_refresh: true,
        }
    }

    /// The owning actor.
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// The last location a crossing was accepted at.
    pub const fn last_valid(&self) -> Option<&Location> {
        self.last_valid.as_ref()
    }

    /// The regions at [`Session::last_valid`].
    pub const fn last_set(&self) -> Option<&ApplicableRegionSet> {
        self.last_set.as_ref()
    }

    /// Whether the handlers agreed on invincibility at the last tick.
    pub const fn is_invincible(&self) -> bool {
        self.invincible
    }

    /// Whether the next dispatch re-seeds every handler first.
    pub const fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Names of the handlers, in dispatch order.
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// The first handler of type `T`.
    pub fn handler<T: Handler>(&self) -> Option<&T> {
        self.handlers
            .iter()
            .find_map(|h| h.as_ref().as_any().downcast_ref::<T>())
    }

    /// The first handler of type `T`, mutably.
    pub fn handler_mut<T: Handler>(&mut self) -> Option<&mut T> {
        self.handlers
            .iter_mut()
            .find_map(|h| h.as_mut().as_any_mut().downcast_mut::<T>())
    }

    /// Seed every handler from the actor's current location.
    ///
    /// Handlers produce no user-visible effects here.
    pub fn initialize(
        &mut self,
        ctx: &HandlerContext<'_>,
        query: &RegionQuery,
    ) -> Result<(), SessionError> {
        let location = ctx.actor.location.clone();
        let set = query.applicable_regions(&location);
        for handler in &mut self.handlers {
            handler
                .initialize(ctx, &location, &set)
                .map_err(|source| SessionError::Initialize {
                    actor: self.actor,
                    handler: handler.name(),
                    source,
                })?;
        }
        self.last_valid = Some(location);
        self.last_set = Some(set);
        self.needs_refresh = false;
        debug!(actor = %self.actor, "session initialized");
        Ok(())
    }

    /// Run one tick of every handler at the actor's current location.
    ///
    /// A failing handler is logged and skipped; the others still run.
    /// Returns the number of handlers that failed.
    pub fn tick(
        &mut self,
        ctx: &HandlerContext<'_>,
        query: &RegionQuery,
    ) -> Result<usize, SessionError> {
        if self.needs_refresh {
            self.initialize(ctx, query)?;
        }

        let set = query.applicable_regions(&ctx.actor.location);
        let ctx = HandlerContext {
            invincible: self.invincible,
            ..*ctx
        };

        let mut failures = 0_usize;
        for handler in &mut self.handlers {
            if let Err(error) = handler.tick(&ctx, &set) {
                warn!(actor = %self.actor, handler = handler.name(), %error, "handler tick failed");
                failures = failures.saturating_add(1);
            }
        }

        self.invincible = self.compute_invincibility(&ctx);
        Ok(failures)
    }

    /// Decide whether the actor may move from `from` to `to`.
    ///
    /// Every handler sees the crossing, even after one has vetoed it.
    /// Handler effects are held back until the verdict is known: on allow
    /// all of them are applied, on deny only those of the vetoing handlers
    /// (their deny messages) are, and every handler is re-seeded at the
    /// rollback location. Non-cancellable moves are always allowed.
    pub fn test_move_to(
        &mut self,
        ctx: &HandlerContext<'_>,
        query: &RegionQuery,
        from: &Location,
        to: &Location,
        move_type: MoveType,
    ) -> Result<CrossingOutcome, SessionError> {
        let refreshing = self.needs_refresh;
        if refreshing {
            self.initialize(ctx, query)?;
        } else if from.same_block(to) {
            return Ok(CrossingOutcome::Allowed);
        }

        let to_set = query.applicable_regions(to);
        let from_set = match self.last_set.take() {
            Some(set) => set,
            None => query.applicable_regions(from),
        };
        let entered: Vec<Arc<Region>> = to_set.difference(&from_set).into_iter().cloned().collect();
        let exited: Vec<Arc<Region>> = from_set.difference(&to_set).into_iter().cloned().collect();

        if entered.is_empty() && exited.is_empty() {
            self.accept(to, to_set);
            return Ok(CrossingOutcome::Allowed);
        }

        let ctx = HandlerContext {
            invincible: self.invincible,
            ..*ctx
        };
        let crossing = Crossing {
            from,
            to,
            from_set: &from_set,
            to_set: &to_set,
            entered: &entered,
            exited: &exited,
            move_type,
        };

        let mut answers = Vec::with_capacity(self.handlers.len());
        for handler in &mut self.handlers {
            let buffer = BufferedHost::new(ctx.host);
            let buffered = HandlerContext {
                host: &buffer,
                ..ctx
            };
            let verdict = match handler.on_cross_boundary(&buffered, &crossing) {
                Ok(verdict) => verdict,
                Err(error) => {
                    warn!(actor = %self.actor, handler = handler.name(), %error, "handler crossing failed");
                    true
                }
            };
            answers.push((verdict, buffer.into_effects()));
        }

        let allowed = !move_type.is_cancellable() || answers.iter().all(|(verdict, _)| *verdict);
        for (verdict, effects) in answers {
            if allowed || !verdict {
                apply_effects(ctx.host, effects);
            }
        }

        if allowed {
            debug!(
                actor = %self.actor,
                entered = entered.len(),
                exited = exited.len(),
                ?move_type,
                "crossing accepted"
            );
            self.accept(to, to_set);
            return Ok(CrossingOutcome::Allowed);
        }

        debug!(actor = %self.actor, ?move_type, "crossing denied");
        let rollback_to = self.last_valid.clone().unwrap_or_else(|| from.clone());
        for handler in &mut self.handlers {
            if let Err(error) = handler.on_crossing_rejected(&ctx, &rollback_to, &from_set) {
                warn!(actor = %self.actor, handler = handler.name(), %error, "handler re-seed failed");
            }
        }
        self.last_set = Some(from_set);
        Ok(CrossingOutcome::Denied { rollback_to })
    }

    /// Forget all handler bookkeeping and re-seed on the next dispatch.
    ///
    /// Calling this twice in a row has the same effect as calling it once.
    pub fn reset_state(&mut self) {
        for handler in &mut self.handlers {
            handler.reset_state();
        }
        self.invincible = false;
        self.needs_refresh = true;
    }

    fn accept(&mut self, to: &Location, set: ApplicableRegionSet) {
        self.last_valid = Some(to.clone());
        self.last_set = Some(set);
    }

    fn compute_invincibility(&self, ctx: &HandlerContext<'_>) -> bool {
        State::combine(self.handlers.iter().map(|h| h.invincibility(ctx))) == Some(State::Allow)
    }
}
