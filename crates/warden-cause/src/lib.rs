//! Cause attribution for the Warden region protection core.
//!
//! When something happens in the world (a block breaks, an explosion goes
//! off, a projectile hits) the protection checks need to know *who* is
//! responsible. This crate turns the objects directly involved into an
//! ordered [`Cause`] chain, root first, following the relations the host
//! exposes through a [`CauseGraph`].
//!
//! # Modules
//!
//! - [`object`] -- Cause objects, identity keys, controller relations and
//!   the [`CauseGraph`] trait.
//! - [`cause`] -- The [`Cause`] chain and its builder.

pub mod cause;
pub mod object;

pub use cause::Cause;
pub use object::{
    CauseGraph, CauseKind, CauseObject, Controller, EntityKind, InMemoryCauseGraph, NoRelations,
    ObjectKey,
};
