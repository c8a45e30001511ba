//! Built-in handlers.
//!
//! # Modules
//!
//! - [`heal`] -- Periodic healing inside regions
//! - [`feed`] -- Periodic feeding inside regions
//! - [`notify`] -- Staff notifications on entry and exit
//! - [`entry`] -- Entry restriction
//! - [`exit`] -- Exit restriction
//! - [`message`] -- Greeting and farewell messages
//! - [`game_mode`] -- Game mode enforcement
//! - [`invincibility`] -- The `invincible` flag
//! - [`god_mode`] -- Administrative god mode
//! - [`water_breathing`] -- Administrative water breathing

pub mod entry;
pub mod exit;
pub mod feed;
pub mod game_mode;
pub mod god_mode;
pub mod heal;
pub mod invincibility;
pub mod message;
pub mod notify;
pub mod water_breathing;

use std::sync::Arc;

pub use entry::EntryHandler;
pub use exit::ExitHandler;
pub use feed::FeedHandler;
pub use game_mode::GameModeHandler;
pub use god_mode::GodModeHandler;
pub use heal::HealHandler;
pub use invincibility::InvincibilityHandler;
pub use message::{FarewellHandler, GreetingHandler};
pub use notify::{NotifyEntryHandler, NotifyExitHandler, notify_permission};
pub use water_breathing::WaterBreathingHandler;

use crate::handler::{Handler, HandlerFactory};

fn factory<H: Handler + Default + 'static>() -> HandlerFactory {
    Arc::new(|| Box::new(H::default()) as Box<dyn Handler>)
}

/// Factories for every built-in handler, in dispatch order.
pub fn default_factories() -> Vec<HandlerFactory> {
    vec![
        factory::<HealHandler>(),
        factory::<FeedHandler>(),
        factory::<NotifyEntryHandler>(),
        factory::<NotifyExitHandler>(),
        factory::<EntryHandler>(),
        factory::<ExitHandler>(),
        factory::<FarewellHandler>(),
        factory::<GreetingHandler>(),
        factory::<GameModeHandler>(),
        factory::<InvincibilityHandler>(),
        factory::<GodModeHandler>(),
        factory::<WaterBreathingHandler>(),
    ]
}
