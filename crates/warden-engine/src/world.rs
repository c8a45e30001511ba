//! An in-memory world standing in for a real game server.
//!
//! Actors are plain snapshots behind a mutex. Effects are applied
//! immediately and messages are written to the log.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;
use warden_regions::{AuthorizationError, Authorizer};
use warden_session::{ActorHost, ActorSnapshot, HostError, MAX_FOOD_LEVEL};
use warden_types::{ActorId, GameMode, Location};

/// Connected actors of the simulated world.
#[derive(Debug, Default)]
pub struct SimulatedWorld {
    actors: Mutex<BTreeMap<ActorId, ActorSnapshot>>,
}

impl SimulatedWorld {
    /// An empty world.
    pub fn new() -> Self {
        Self::default()
    }

    fn actors(&self) -> MutexGuard<'_, BTreeMap<ActorId, ActorSnapshot>> {
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connect a fresh actor at `location`.
    pub fn spawn(&self, name: &str, groups: &[String], location: Location) -> ActorId {
        let id = ActorId::new();
        let snapshot = ActorSnapshot {
            id,
            name: name.to_owned(),
            groups: groups.to_vec(),
            location,
            health: 20.0,
            max_health: 20.0,
            food_level: MAX_FOOD_LEVEL,
            saturation: 5.0,
            remaining_air: 300,
            max_air: 300,
            game_mode: GameMode::Survival,
        };
        self.actors().insert(id, snapshot);
        info!(actor = %id, name, "actor joined");
        id
    }

    /// Put an actor somewhere without asking anybody.
    pub fn place(&self, id: ActorId, location: Location) {
        if let Some(actor) = self.actors().get_mut(&id) {
            actor.location = location;
        }
    }

    /// Apply the passage of time: actors get a little hungrier and hurt.
    pub fn weather(&self) {
        for actor in self.actors().values_mut() {
            actor.food_level = actor.food_level.saturating_sub(1).max(0);
            actor.health = (actor.health - 0.5).max(1.0);
        }
    }

    fn with_actor(&self, id: ActorId, change: impl FnOnce(&mut ActorSnapshot)) -> Result<(), HostError> {
        let mut actors = self.actors();
        let actor = actors.get_mut(&id).ok_or(HostError::ActorGone(id))?;
        change(actor);
        Ok(())
    }
}

impl ActorHost for SimulatedWorld {
    fn online_actors(&self) -> Vec<ActorId> {
        self.actors().keys().copied().collect()
    }

    fn actor(&self, id: ActorId) -> Option<ActorSnapshot> {
        self.actors().get(&id).cloned()
    }

    fn set_health(&self, id: ActorId, health: f64) -> Result<(), HostError> {
        self.with_actor(id, |a| a.health = health)
    }

    fn set_food(&self, id: ActorId, food_level: i32, saturation: f64) -> Result<(), HostError> {
        self.with_actor(id, |a| {
            a.food_level = food_level;
            a.saturation = saturation;
        })
    }

    fn set_game_mode(&self, id: ActorId, mode: GameMode) -> Result<(), HostError> {
        self.with_actor(id, |a| a.game_mode = mode)?;
        info!(actor = %id, ?mode, "game mode changed");
        Ok(())
    }

    fn set_remaining_air(&self, id: ActorId, air: i32) -> Result<(), HostError> {
        self.with_actor(id, |a| a.remaining_air = air)
    }

    fn send_message(&self, id: ActorId, message: &str) -> Result<(), HostError> {
        let name = self
            .actors()
            .get(&id)
            .map(|a| a.name.clone())
            .ok_or(HostError::ActorGone(id))?;
        info!(to = %name, message, "message");
        Ok(())
    }
}

/// Permissions granted up front by actor name.
#[derive(Debug, Default)]
pub struct StaticAuthorizer {
    grants: HashMap<ActorId, HashSet<String>>,
}

impl StaticAuthorizer {
    /// An authorizer that grants nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `permission` to `actor`.
    pub fn grant(&mut self, actor: ActorId, permission: impl Into<String>) {
        self.grants.entry(actor).or_default().insert(permission.into());
    }
}

impl Authorizer for StaticAuthorizer {
    fn has_permission(&self, actor: ActorId, permission: &str) -> Result<bool, AuthorizationError> {
        Ok(self
            .grants
            .get(&actor)
            .is_some_and(|granted| granted.contains(permission)))
    }
}
