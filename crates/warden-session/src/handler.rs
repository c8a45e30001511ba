//! The handler capability set.
//!
//! A [`Handler`] is one unit of recurring per-actor behavior inside a
//! session, usually reacting to one flag family. Every method has a no-op
//! default so a handler implements only what it needs.

use std::any::Any;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use warden_query::ApplicableRegionSet;
use warden_regions::{Authorizer, Region, Subject};
use warden_types::{Location, MoveType, State};

use crate::error::{HandlerError, HostError};
use crate::host::{ActorHost, ActorSnapshot};

/// Everything a handler may look at or act on during one dispatch.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    /// World mutation surface.
    pub host: &'a dyn ActorHost,
    /// Authorization service, for notification recipients.
    pub authorizer: &'a dyn Authorizer,
    /// The actor as it was when the dispatch started.
    pub actor: &'a ActorSnapshot,
    /// The actor as a query subject.
    pub subject: &'a Subject,
    /// Wall-clock time of the dispatch.
    pub now: DateTime<Utc>,
    /// Whether the actor bypasses region protection in the relevant world.
    pub bypass: bool,
    /// Whether the session is currently invincible.
    pub invincible: bool,
}

impl core::fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("actor", &self.actor.id)
            .field("now", &self.now)
            .field("bypass", &self.bypass)
            .field("invincible", &self.invincible)
            .finish_non_exhaustive()
    }
}

impl HandlerContext<'_> {
    /// Send a message to the actor, expanding `%name%` and `%world%`.
    pub fn send_message(&self, message: &str) -> Result<(), HostError> {
        let text = format_message(self.actor, message);
        self.host.send_message(self.actor.id, &text)
    }
}

/// Expand the `%name%` and `%world%` placeholders in a region message.
pub fn format_message(actor: &ActorSnapshot, message: &str) -> String {
    message
        .replace("%name%", &actor.name)
        .replace("%world%", &actor.location.world)
}

/// A change in the set of regions containing an actor.
#[derive(Debug, Clone, Copy)]
pub struct Crossing<'a> {
    /// Last valid location.
    pub from: &'a Location,
    /// Destination.
    pub to: &'a Location,
    /// Regions at the last valid location.
    pub from_set: &'a ApplicableRegionSet,
    /// Regions at the destination.
    pub to_set: &'a ApplicableRegionSet,
    /// Regions at the destination that were not at the origin.
    pub entered: &'a [Arc<Region>],
    /// Regions at the origin that are not at the destination.
    pub exited: &'a [Arc<Region>],
    /// How the actor moved.
    pub move_type: MoveType,
}

/// Downcasting support for handlers.
pub trait AsAny: Any {
    /// `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// `self` as mutable [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// One unit of per-actor behavior.
///
/// Handlers own only their private bookkeeping. They may run in any order
/// within a dispatch and must not rely on another handler having run.
pub trait Handler: AsAny + Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Seed bookkeeping from the actor's current position without any
    /// user-visible effect. Called when the session is created and on the
    /// first dispatch after a reset.
    fn initialize(
        &mut self,
        _ctx: &HandlerContext<'_>,
        _location: &Location,
        _set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Apply continuous effects for the actor's current regions.
    fn tick(
        &mut self,
        _ctx: &HandlerContext<'_>,
        _set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// React to a change of regions. Returning `false` vetoes the move.
    fn on_cross_boundary(
        &mut self,
        _ctx: &HandlerContext<'_>,
        _crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        Ok(true)
    }

    /// The session refused a crossing this handler has already seen.
    ///
    /// Called with the location the actor is rolled back to and its
    /// regions, so bookkeeping saved during the crossing can be put back.
    /// Must not produce user-visible effects. Re-seeds through
    /// [`Handler::initialize`] by default.
    fn on_crossing_rejected(
        &mut self,
        ctx: &HandlerContext<'_>,
        location: &Location,
        set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        self.initialize(ctx, location, set)
    }

    /// Forget all bookkeeping. Must be idempotent.
    fn reset_state(&mut self) {}

    /// This handler's opinion on whether the actor is invincible.
    fn invincibility(&self, _ctx: &HandlerContext<'_>) -> Option<State> {
        None
    }
}

/// Creates a fresh handler for each new session.
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>;
