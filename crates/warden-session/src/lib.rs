//! Per-actor sessions for the Warden region protection core.
//!
//! A [`Session`] holds one actor's [`Handler`]s and the last place the
//! actor was allowed to be. The [`SessionManager`] creates sessions on
//! demand, ticks them on a fixed interval, and turns boundary crossings
//! into allow/deny verdicts the host enforces.
//!
//! # Modules
//!
//! - [`host`] -- The world mutation surface and actor snapshots
//! - [`handler`] -- The handler capability set and dispatch context
//! - [`tracker`] -- Flag value change tracking for handlers
//! - [`handlers`] -- Built-in handlers
//! - [`session`] -- One actor's session
//! - [`cache`] -- Loading cache with time-based expiry
//! - [`manager`] -- The session manager
//! - [`error`] -- Host, handler and session errors

pub mod cache;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod host;
pub mod manager;
pub mod session;
pub mod tracker;

pub use cache::{Expiry, LoadingCache};
pub use error::{HandlerError, HostError, SessionError};
pub use handler::{Crossing, Handler, HandlerContext, HandlerFactory, format_message};
pub use handlers::{default_factories, notify_permission};
pub use host::{ActorHost, ActorSnapshot, BufferedHost, Effect, MAX_FOOD_LEVEL, apply_effects};
pub use manager::{SessionHandle, SessionManager, SessionSettings, TickReport};
pub use session::{CrossingOutcome, Session};
pub use tracker::{FlagValueChangeTracker, ValueChange};
