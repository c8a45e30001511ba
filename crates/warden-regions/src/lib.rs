//! Region data model, geometry and permission model for Warden.
//!
//! Regions are read-only from the point of view of the resolution engine
//! and the session layer: they are built once (from configuration or by an
//! administrative layer), wrapped in `Arc`, and shared.
//!
//! # Modules
//!
//! - [`region`] -- The [`Region`] type: identity, priority, parent,
//!   domains, flag values
//! - [`domain`] -- Owner and member [`Domain`]s
//! - [`shape`] -- Region geometry
//! - [`subject`] -- The [`Subject`] a query or check is made for
//! - [`index`] -- [`RegionContainer`], serde [`RegionDefinition`]s and the
//!   reference [`RegionIndex`]
//! - [`permission`] -- [`RegionPermissionModel`] and the [`Authorizer`]
//!   trait
//! - [`error`] -- [`RegionError`] and [`AuthorizationError`]

pub mod domain;
pub mod error;
pub mod index;
pub mod permission;
pub mod region;
pub mod shape;
pub mod subject;

pub use domain::Domain;
pub use error::{AuthorizationError, RegionError};
pub use index::{RegionContainer, RegionDefinition, RegionIndex, WorldRegions};
pub use permission::{Authorizer, RegionPermissionModel, bypass_permission, check_permission};
pub use region::{GLOBAL_REGION_ID, Region};
pub use shape::Shape;
pub use subject::Subject;
