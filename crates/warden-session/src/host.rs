//! The host world as seen by the session layer.
//!
//! Sessions never hold on to host objects. They refer to actors by
//! [`ActorId`], read an [`ActorSnapshot`] at the start of each dispatch,
//! and push changes back through the [`ActorHost`] effect sinks.

use std::sync::{Mutex, PoisonError};

use tracing::warn;
use warden_types::{ActorId, GameMode, Location};

use crate::error::HostError;

/// Highest food level an actor can have.
pub const MAX_FOOD_LEVEL: i32 = 20;

/// The state of an actor at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    /// Stable identity.
    pub id: ActorId,
    /// Display name, used in messages.
    pub name: String,
    /// Permission groups, matched against region domains.
    pub groups: Vec<String>,
    /// Where the actor is.
    pub location: Location,
    /// Current health; zero or less means dead.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Food level, `0..=20`.
    pub food_level: i32,
    /// Saturation.
    pub saturation: f64,
    /// Remaining air ticks.
    pub remaining_air: i32,
    /// Maximum air ticks.
    pub max_air: i32,
    /// Current game mode.
    pub game_mode: GameMode,
}

impl ActorSnapshot {
    /// Whether the actor is dead.
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// The connection registry and world mutation surface.
///
/// Effect methods are fire-and-forget from the core's point of view; an
/// error means the change did not happen.
pub trait ActorHost: Send + Sync {
    /// Every connected actor.
    fn online_actors(&self) -> Vec<ActorId>;

    /// The current state of an actor, or `None` if it is not online.
    fn actor(&self, id: ActorId) -> Option<ActorSnapshot>;

    /// Set an actor's health.
    fn set_health(&self, id: ActorId, health: f64) -> Result<(), HostError>;

    /// Set an actor's food level and saturation.
    fn set_food(&self, id: ActorId, food_level: i32, saturation: f64) -> Result<(), HostError>;

    /// Change an actor's game mode.
    fn set_game_mode(&self, id: ActorId, mode: GameMode) -> Result<(), HostError>;

    /// Set an actor's remaining air.
    fn set_remaining_air(&self, id: ActorId, air: i32) -> Result<(), HostError>;

    /// Show a message to an actor.
    fn send_message(&self, id: ActorId, message: &str) -> Result<(), HostError>;
}

/// A world mutation recorded but not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// [`ActorHost::set_health`].
    Health(f64),
    /// [`ActorHost::set_food`].
    Food {
        /// New food level.
        food_level: i32,
        /// New saturation.
        saturation: f64,
    },
    /// [`ActorHost::set_game_mode`].
    GameMode(GameMode),
    /// [`ActorHost::set_remaining_air`].
    RemainingAir(i32),
    /// [`ActorHost::send_message`].
    Message(String),
}

/// An [`ActorHost`] that reads through to the real host but holds every
/// effect back until [`BufferedHost::into_effects`].
///
/// A crossing runs each handler against its own buffer so the session
/// can decide which effects to apply once the verdict is known.
pub struct BufferedHost<'h> {
    inner: &'h dyn ActorHost,
    pending: Mutex<Vec<(ActorId, Effect)>>,
}

impl core::fmt::Debug for BufferedHost<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BufferedHost")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl<'h> BufferedHost<'h> {
    /// An empty buffer in front of `inner`.
    pub fn new(inner: &'h dyn ActorHost) -> Self {
        Self {
            inner,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The recorded effects, in the order they were requested.
    pub fn into_effects(self) -> Vec<(ActorId, Effect)> {
        self.pending.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, id: ActorId, effect: Effect) -> Result<(), HostError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if self.inner.actor(id).is_none() {
            return Err(HostError::ActorGone(id));
        }
        pending.push((id, effect));
        Ok(())
    }
}

impl ActorHost for BufferedHost<'_> {
    fn online_actors(&self) -> Vec<ActorId> {
        self.inner.online_actors()
    }

    fn actor(&self, id: ActorId) -> Option<ActorSnapshot> {
        self.inner.actor(id)
    }

    fn set_health(&self, id: ActorId, health: f64) -> Result<(), HostError> {
        self.record(id, Effect::Health(health))
    }

    fn set_food(&self, id: ActorId, food_level: i32, saturation: f64) -> Result<(), HostError> {
        self.record(
            id,
            Effect::Food {
                food_level,
                saturation,
            },
        )
    }

    fn set_game_mode(&self, id: ActorId, mode: GameMode) -> Result<(), HostError> {
        self.record(id, Effect::GameMode(mode))
    }

    fn set_remaining_air(&self, id: ActorId, air: i32) -> Result<(), HostError> {
        self.record(id, Effect::RemainingAir(air))
    }

    fn send_message(&self, id: ActorId, message: &str) -> Result<(), HostError> {
        self.record(id, Effect::Message(message.to_owned()))
    }
}

/// Apply recorded effects to `host` in order.
///
/// A failing effect is logged and the rest are still applied. Returns the
/// number of failures.
pub fn apply_effects(host: &dyn ActorHost, effects: Vec<(ActorId, Effect)>) -> usize {
    let mut failures = 0_usize;
    for (id, effect) in effects {
        let result = match effect {
            Effect::Health(health) => host.set_health(id, health),
            Effect::Food {
                food_level,
                saturation,
            } => host.set_food(id, food_level, saturation),
            Effect::GameMode(mode) => host.set_game_mode(id, mode),
            Effect::RemainingAir(air) => host.set_remaining_air(id, air),
            Effect::Message(message) => host.send_message(id, &message),
        };
        if let Err(error) = result {
            warn!(actor = %id, %error, "deferred effect failed");
            failures = failures.saturating_add(1);
        }
    }
    failures
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Recorder {
        online: ActorId,
        messages: Mutex<Vec<String>>,
    }

    impl ActorHost for Recorder {
        fn online_actors(&self) -> Vec<ActorId> {
            vec![self.online]
        }

        fn actor(&self, id: ActorId) -> Option<ActorSnapshot> {
            (id == self.online).then(|| ActorSnapshot {
                id,
                name: String::from("ada"),
                groups: Vec::new(),
                location: Location::new("world", 0.0, 64.0, 0.0),
                health: 20.0,
                max_health: 20.0,
                food_level: 20,
                saturation: 5.0,
                remaining_air: 300,
                max_air: 300,
                game_mode: GameMode::Survival,
            })
        }

        fn set_health(&self, _id: ActorId, _health: f64) -> Result<(), HostError> {
            Ok(())
        }

        fn set_food(&self, _id: ActorId, _food_level: i32, _saturation: f64) -> Result<(), HostError> {
            Ok(())
        }

        fn set_game_mode(&self, _id: ActorId, _mode: GameMode) -> Result<(), HostError> {
            Ok(())
        }

        fn set_remaining_air(&self, _id: ActorId, _air: i32) -> Result<(), HostError> {
            Ok(())
        }

        fn send_message(&self, id: ActorId, message: &str) -> Result<(), HostError> {
            if id != self.online {
                return Err(HostError::ActorGone(id));
            }
            self.messages.lock().unwrap().push(message.to_owned());
            Ok(())
        }
    }

    #[test]
    fn buffered_effects_wait_for_apply() {
        let ada = ActorId::new();
        let host = Recorder {
            online: ada,
            messages: Mutex::new(Vec::new()),
        };
        let buffer = BufferedHost::new(&host);
        buffer.send_message(ada, "first").unwrap();
        buffer.set_health(ada, 4.0).unwrap();
        buffer.send_message(ada, "second").unwrap();
        assert!(host.messages.lock().unwrap().is_empty());

        let effects = buffer.into_effects();
        assert_eq!(effects.len(), 3);
        assert_eq!(apply_effects(&host, effects), 0);
        assert_eq!(*host.messages.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn buffer_refuses_departed_actors() {
        let host = Recorder {
            online: ActorId::new(),
            messages: Mutex::new(Vec::new()),
        };
        let gone = ActorId::new();
        let buffer = BufferedHost::new(&host);
        assert_eq!(buffer.send_message(gone, "hi"), Err(HostError::ActorGone(gone)));
        assert!(buffer.into_effects().is_empty());
    }
}
