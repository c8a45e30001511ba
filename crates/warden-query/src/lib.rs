//! Flag resolution engine for Warden.
//!
//! Computes the effective value of a flag at a point for a subject, given
//! the overlapping, prioritized and nested regions containing that point.
//!
//! # Resolution
//!
//! 1. The regions containing the point are sorted by priority descending,
//!    then by id ascending.
//! 2. Each region contributes the first value found along its parent
//!    chain whose companion group admits the subject. Regions shadow their
//!    own ancestors.
//! 3. State flags keep only the highest priority level that yields a
//!    value; DENY beats ALLOW at that level.
//! 4. Other flags take the first contribution.
//! 5. With no contribution, the world's global region and then the flag's
//!    default apply.
//!
//! # Modules
//!
//! - [`calculator`] -- Per-region effective values and contribution
//!   collection
//! - [`set`] -- [`ApplicableRegionSet`] and its queries
//! - [`query`] -- [`RegionQuery`] over a region container

pub mod calculator;
pub mod query;
pub mod set;

pub use query::RegionQuery;
pub use set::ApplicableRegionSet;
