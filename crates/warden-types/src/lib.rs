//! Shared type definitions for the Warden region protection core.
//!
//! Everything the resolution engine, the cause builder and the session layer
//! agree on lives here so the higher crates never depend on each other just
//! to name a type.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for actors and entities
//! - [`location`] -- World positions and block coordinates
//! - [`enums`] -- State, membership classes, game modes, move types
//! - [`flag`] -- Flag definitions and typed flag values
//! - [`flags`] -- Built-in flags and the [`FlagRegistry`]
//! - [`error`] -- Errors raised while defining or parsing flags

pub mod enums;
pub mod error;
pub mod flag;
pub mod flags;
pub mod ids;
pub mod location;

// Re-export all public types at crate root for convenience.
pub use enums::{Association, GameMode, MoveType, RegionGroup, State};
pub use error::FlagError;
pub use flag::{Flag, FlagKind, FlagLiteral, FlagValue, GROUP_FLAG_SUFFIX};
pub use flags::FlagRegistry;
pub use ids::{ActorId, EntityId};
pub use location::{BlockPosition, Location, Vec3};
