//! Error types for the `warden-regions` crate.
//!
//! Building regions and region indexes returns [`RegionError`]; the
//! external authorization service reports failures as
//! [`AuthorizationError`].

use warden_types::FlagError;

/// Errors that can occur while constructing regions or a region index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    /// The identifier contains characters outside the allowed set or is
    /// empty.
    #[error("invalid region id: {0:?}")]
    InvalidId(String),

    /// Two regions in the same world share an identifier.
    #[error("duplicate region id: {0}")]
    DuplicateRegion(String),

    /// A region names a parent that does not exist in its world.
    #[error("region {region} names unknown parent {parent}")]
    UnknownParent {
        /// The child region.
        region: String,
        /// The missing parent.
        parent: String,
    },

    /// Setting the parent would make the region its own ancestor.
    #[error("circular inheritance: {region} cannot have parent {parent}")]
    CircularInheritance {
        /// The child region.
        region: String,
        /// The parent that would close the cycle.
        parent: String,
    },

    /// A polygon was given fewer than three points.
    #[error("region {region} has a degenerate polygon ({points} points)")]
    DegeneratePolygon {
        /// The offending region.
        region: String,
        /// Number of points supplied.
        points: usize,
    },

    /// The global region cannot have a parent or placed geometry.
    #[error("global region of world {0} cannot have a parent")]
    GlobalWithParent(String),

    /// A flag entry on the region could not be applied.
    #[error("region {region}: {source}")]
    Flag {
        /// The region being configured.
        region: String,
        /// The underlying flag error.
        source: FlagError,
    },
}

/// Errors reported by the external authorization service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    /// The service could not be reached or is not loaded.
    #[error("authorization service unavailable: {0}")]
    Unavailable(String),

    /// The service does not know the actor.
    #[error("actor unknown to authorization service: {0}")]
    UnknownActor(String),
}
