//! Shared fixtures for session tests: an in-memory host, a scripted
//! authorizer and region helpers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use warden_query::RegionQuery;
use warden_regions::{AuthorizationError, Authorizer, Region, RegionIndex, Shape};
use warden_session::{ActorHost, ActorSnapshot, HostError};
use warden_types::{ActorId, BlockPosition, GameMode, Location};

pub const WORLD: &str = "world";

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

#[derive(Default)]
struct HostState {
    actors: HashMap<ActorId, ActorSnapshot>,
    messages: Vec<(ActorId, String)>,
}

/// Connected actors kept in memory; every effect is applied immediately.
#[derive(Default)]
pub struct MockHost {
    state: Mutex<HostState>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connect a healthy survival-mode actor at `location`.
    pub fn join(&self, name: &str, location: Location) -> ActorId {
        let id = ActorId::new();
        self.join_as(id, name, location);
        id
    }

    /// Connect an actor with a known id.
    pub fn join_as(&self, id: ActorId, name: &str, location: Location) {
        let snapshot = ActorSnapshot {
            id,
            name: name.to_owned(),
            groups: Vec::new(),
            location,
            health: 20.0,
            max_health: 20.0,
            food_level: 20,
            saturation: 5.0,
            remaining_air: 300,
            max_air: 300,
            game_mode: GameMode::Survival,
        };
        self.state().actors.insert(id, snapshot);
    }

    pub fn leave(&self, id: ActorId) {
        self.state().actors.remove(&id);
    }

    pub fn update(&self, id: ActorId, change: impl FnOnce(&mut ActorSnapshot)) {
        if let Some(actor) = self.state().actors.get_mut(&id) {
            change(actor);
        }
    }

    pub fn move_to(&self, id: ActorId, location: Location) {
        self.update(id, |a| a.location = location);
    }

    pub fn snapshot(&self, id: ActorId) -> Option<ActorSnapshot> {
        self.state().actors.get(&id).cloned()
    }

    pub fn messages_for(&self, id: ActorId) -> Vec<String> {
        self.state()
            .messages
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn clear_messages(&self) {
        self.state().messages.clear();
    }

    fn with_actor(&self, id: ActorId, change: impl FnOnce(&mut ActorSnapshot)) -> Result<(), HostError> {
        let mut state = self.state();
        let actor = state.actors.get_mut(&id).ok_or(HostError::ActorGone(id))?;
        change(actor);
        Ok(())
    }
}

impl ActorHost for MockHost {
    fn online_actors(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = self.state().actors.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn actor(&self, id: ActorId) -> Option<ActorSnapshot> {
        self.snapshot(id)
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
        self.with_actor(id, |a| a.game_mode = mode)
    }

    fn set_remaining_air(&self, id: ActorId, air: i32) -> Result<(), HostError> {
        self.with_actor(id, |a| a.remaining_air = air)
    }

    fn send_message(&self, id: ActorId, message: &str) -> Result<(), HostError> {
        let mut state = self.state();
        if !state.actors.contains_key(&id) {
            return Err(HostError::ActorGone(id));
        }
        state.messages.push((id, message.to_owned()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Authorizer
// ---------------------------------------------------------------------------

/// Grants exactly the permissions it was told to, and counts lookups.
#[derive(Default)]
pub struct MockAuthorizer {
    grants: Mutex<HashSet<(ActorId, String)>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockAuthorizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn grants(&self) -> MutexGuard<'_, HashSet<(ActorId, String)>> {
        self.grants.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn grant(&self, actor: ActorId, permission: &str) {
        self.grants().insert((actor, permission.to_owned()));
    }

    pub fn revoke(&self, actor: ActorId, permission: &str) {
        self.grants().remove(&(actor, permission.to_owned()));
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Authorizer for MockAuthorizer {
    fn has_permission(&self, actor: ActorId, permission: &str) -> Result<bool, AuthorizationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthorizationError::Unavailable(String::from("directory offline")));
        }
        Ok(self.grants().contains(&(actor, permission.to_owned())))
    }
}

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// A column-shaped region spanning the whole height of the world.
pub fn column(id: &str, min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Region {
    Region::new(
        id,
        Shape::cuboid(BlockPosition::new(min_x, 0, min_z), BlockPosition::new(max_x, 255, max_z)),
    )
    .unwrap_or_else(|_| Region::global())
}

/// A query over [`WORLD`] holding `regions`.
pub fn query_with(regions: Vec<Region>) -> RegionQuery {
    let mut index = RegionIndex::new();
    let world = index.world_mut(WORLD);
    for region in regions {
        assert!(world.insert(region).is_ok());
    }
    RegionQuery::new(Arc::new(index))
}

pub fn at(x: f64, z: f64) -> Location {
    Location::new(WORLD, x, 64.0, z)
}
