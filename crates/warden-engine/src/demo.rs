//! Demo population and movement.
//!
//! Actors wander randomly around the configured world. Every step that
//! leaves the current block is put to the session manager, and denied
//! steps are rolled back the way a game server would.

use std::path::Path;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use warden_core::DriverControl;
use warden_session::{ActorHost, CrossingOutcome, SessionManager};
use warden_types::{ActorId, Location, MoveType};

use crate::error::EngineError;
use crate::world::SimulatedWorld;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Demo settings, read from the `demo` section of `warden-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DemoConfig {
    /// World the actors walk in.
    #[serde(default = "default_world")]
    pub world: String,

    /// The wandering actors.
    #[serde(default = "default_actors")]
    pub actors: Vec<DemoActor>,

    /// Milliseconds between movement steps.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,

    /// Largest distance covered in one step, per axis.
    #[serde(default = "default_stride")]
    pub stride: f64,

    /// Chance that a step is a teleport to a random spot.
    #[serde(default = "default_teleport_chance")]
    pub teleport_chance: f64,

    /// Half the side length of the square the actors roam in.
    #[serde(default = "default_roam_radius")]
    pub roam_radius: f64,

    /// Random seed for reproducible walks.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// One simulated actor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoActor {
    /// Display name.
    pub name: String,

    /// Permission groups, matched against region members and owners.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Grant region bypass in the demo world.
    #[serde(default)]
    pub bypass: bool,

    /// Grant the notification permission.
    #[serde(default)]
    pub staff: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            world: default_world(),
            actors: default_actors(),
            step_ms: default_step_ms(),
            stride: default_stride(),
            teleport_chance: default_teleport_chance(),
            roam_radius: default_roam_radius(),
            seed: default_seed(),
        }
    }
}

fn default_world() -> String {
    String::from("world")
}

fn default_actors() -> Vec<DemoActor> {
    ["alice", "bob", "carol"]
        .into_iter()
        .map(|name| DemoActor {
            name: name.to_owned(),
            groups: Vec::new(),
            bypass: false,
            staff: false,
        })
        .collect()
}

const fn default_step_ms() -> u64 {
    250
}

const fn default_stride() -> f64 {
    3.0
}

const fn default_teleport_chance() -> f64 {
    0.05
}

const fn default_roam_radius() -> f64 {
    64.0
}

const fn default_seed() -> u64 {
    42
}

/// Load the `demo` section of the config file.
///
/// Defaults are used if the file or the section is missing.
pub fn load_demo_config(path: &Path) -> Result<DemoConfig, EngineError> {
    if !path.exists() {
        return Ok(DemoConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Demo {
        message: format!("failed to read config file: {e}"),
    })?;

    // Parse the full YAML and extract just the "demo" section.
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Demo {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    let config: DemoConfig = raw.get("demo").map_or_else(
        || Ok(DemoConfig::default()),
        |section| {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Demo {
                message: format!("failed to parse demo config: {e}"),
            })
        },
    )?;
    Ok(config.sanitized())
}

impl DemoConfig {
    /// Replace distances and chances that cannot drive a random walk
    /// (NaN, infinite) with their defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if !self.stride.is_finite() {
            warn!(stride = self.stride, "invalid demo stride, using default");
            self.stride = default_stride();
        }
        if !self.roam_radius.is_finite() {
            warn!(roam_radius = self.roam_radius, "invalid demo roam radius, using default");
            self.roam_radius = default_roam_radius();
        }
        if !self.teleport_chance.is_finite() {
            warn!(
                teleport_chance = self.teleport_chance,
                "invalid demo teleport chance, using default"
            );
            self.teleport_chance = default_teleport_chance();
        }
        self
    }
}

// -----------------------------------------------------------------------
// Movement
// -----------------------------------------------------------------------

/// Walk every online actor one step per interval until `control` stops.
pub async fn wander(
    world: &SimulatedWorld,
    manager: &SessionManager,
    control: &DriverControl,
    config: &DemoConfig,
) {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut ticker = interval(Duration::from_millis(config.step_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut denied = 0_u64;

    while !control.is_stop_requested() {
        ticker.tick().await;
        for actor in world.online_actors() {
            if step(world, manager, config, &mut rng, actor) == Some(false) {
                denied = denied.saturating_add(1);
            }
        }
        world.weather();
    }
    info!(denied, "wandering stopped");
}

/// Move one actor. Returns whether the move was allowed, or `None` if the
/// actor stayed in its block or could not be asked about.
fn step(
    world: &SimulatedWorld,
    manager: &SessionManager,
    config: &DemoConfig,
    rng: &mut StdRng,
    actor: ActorId,
) -> Option<bool> {
    let from = world.actor(actor)?.location;
    let radius = config.roam_radius.abs();
    let stride = config.stride.abs();
    let (to, move_type) = if rng.random_bool(config.teleport_chance.clamp(0.0, 1.0)) {
        let x = rng.random_range(-radius..=radius);
        let z = rng.random_range(-radius..=radius);
        (Location::new(config.world.clone(), x, from.position.y, z), MoveType::Teleport)
    } else {
        let dx = rng.random_range(-stride..=stride);
        let dz = rng.random_range(-stride..=stride);
        let x = (from.position.x + dx).clamp(-radius, radius);
        let z = (from.position.z + dz).clamp(-radius, radius);
        (Location::new(config.world.clone(), x, from.position.y, z), MoveType::Move)
    };

    if from.same_block(&to) {
        world.place(actor, to);
        return None;
    }

    match manager.on_cross_boundary(actor, &from, &to, move_type) {
        Ok(CrossingOutcome::Allowed) => {
            world.place(actor, to);
            Some(true)
        }
        Ok(CrossingOutcome::Denied { rollback_to }) => {
            debug!(actor = %actor, ?move_type, "move denied, rolling back");
            world.place(actor, rollback_to);
            Some(false)
        }
        Err(error) => {
            warn!(actor = %actor, %error, "crossing check failed");
            None
        }
    }
}
