//! Demo host for the Warden region protection core.
//!
//! Stands in for a game server: a handful of simulated actors wander
//! around a world whose regions come from `warden-config.yaml`, every
//! boundary crossing is put to the session manager, and the tick driver
//! applies continuous region effects once per interval.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `warden-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the region index for every configured world
//! 4. Spawn the demo actors and grant their permissions
//! 5. Run the tick driver and the wander loop until stopped
//! 6. Log the result

mod demo;
mod error;
mod world;

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warden_core::{DriverControl, WardenConfig, run_tick_driver};
use warden_regions::bypass_permission;
use warden_session::{ActorHost, SessionManager, notify_permission};
use warden_types::{FlagRegistry, Location};

use crate::demo::DemoConfig;
use crate::error::EngineError;
use crate::world::{SimulatedWorld, StaticAuthorizer};

const CONFIG_PATH: &str = "warden-config.yaml";

/// Height the demo actors walk at.
const GROUND_LEVEL: f64 = 64.0;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration before logging so the level can come from it.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!("warden-engine starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        worlds = config.worlds.len(),
        tick_interval_ms = config.driver.tick_interval_ms,
        max_ticks = config.driver.max_ticks,
        "Configuration loaded"
    );

    // 3. Build regions.
    let registry = FlagRegistry::with_builtin();
    let query = config.build_query(&registry).map_err(EngineError::from)?;
    info!(flags = registry.len(), "Region index built");

    // 4. Spawn demo actors.
    let demo_config = demo::load_demo_config(Path::new(CONFIG_PATH))?;
    let world = Arc::new(SimulatedWorld::new());
    let authorizer = Arc::new(populate(&world, &demo_config));
    info!(
        world = demo_config.world,
        actors = demo_config.actors.len(),
        "Demo actors spawned"
    );

    let manager = SessionManager::new(
        Arc::clone(&world) as Arc<dyn ActorHost>,
        authorizer,
        query,
        config.session_settings(),
    );

    // 5. Run until the driver finishes or the process is interrupted.
    let control = DriverControl::new();
    let driver = async {
        let result = run_tick_driver(&manager, &control, &config.driver).await;
        control.request_stop();
        result
    };
    let wander = demo::wander(&world, &manager, &control, &demo_config);
    let run = async { tokio::join!(driver, wander) };
    tokio::pin!(run);

    let (summary, ()) = tokio::select! {
        out = &mut run => out,
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Interrupt received, stopping"),
                Err(e) => warn!(error = %e, "failed to listen for interrupt, stopping"),
            }
            control.request_stop();
            (&mut run).await
        }
    };
    let summary = summary.map_err(EngineError::from)?;

    // 6. Log results.
    info!(
        end_reason = ?summary.end_reason,
        total_ticks = summary.total_ticks,
        failed_actor_ticks = summary.failed_actor_ticks,
        handler_failures = summary.handler_failures,
        sessions = manager.session_count(),
        "warden-engine shutdown complete"
    );

    Ok(())
}

/// Load `warden-config.yaml`, falling back to defaults if it is missing.
///
/// Also reports whether the file was found, since logging is not up yet.
fn load_config() -> Result<(WardenConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((WardenConfig::from_file(config_path)?, true))
    } else {
        Ok((WardenConfig::default(), false))
    }
}

fn init_tracing(config: &WardenConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Spawn every configured actor at a random spot and grant its permissions.
fn populate(world: &SimulatedWorld, config: &DemoConfig) -> StaticAuthorizer {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut authorizer = StaticAuthorizer::new();
    let radius = config.roam_radius.abs();
    for actor in &config.actors {
        let x = rng.random_range(-radius..=radius);
        let z = rng.random_range(-radius..=radius);
        let id = world.spawn(
            &actor.name,
            &actor.groups,
            Location::new(config.world.clone(), x, GROUND_LEVEL, z),
        );
        if actor.bypass {
            authorizer.grant(id, bypass_permission(&config.world));
        }
        if actor.staff {
            authorizer.grant(id, notify_permission());
        }
    }
    authorizer
}
