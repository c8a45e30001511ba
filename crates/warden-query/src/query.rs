//! Point queries against a region container.

use std::sync::Arc;

use tracing::trace;
use warden_regions::{RegionContainer, Subject};
use warden_types::{Flag, FlagValue, Location, State};

use crate::set::ApplicableRegionSet;

/// Builds [`ApplicableRegionSet`]s from a [`RegionContainer`] and answers
/// one-shot flag queries at a location.
#[derive(Clone)]
pub struct RegionQuery {
    container: Arc<dyn RegionContainer>,
}

impl core::fmt::Debug for RegionQuery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegionQuery").finish_non_exhaustive()
    }
}

impl RegionQuery {
    /// Create a query over `container`.
    pub fn new(container: Arc<dyn RegionContainer>) -> Self {
        Self { container }
    }

    /// The regions applying at `location`.
    pub fn applicable_regions(&self, location: &Location) -> ApplicableRegionSet {
        let point = location.block();
        let regions = self.container.regions_containing(&location.world, point);
        let global = self.container.global_region(&location.world);
        trace!(
            world = %location.world,
            %point,
            regions = regions.len(),
            "computed applicable regions"
        );
        ApplicableRegionSet::new(location.world.clone(), point, regions, global)
    }

    /// The effective value of `flag` at `location`.
    pub fn query_value(&self, location: &Location, subject: &Subject, flag: &Flag) -> Option<FlagValue> {
        self.applicable_regions(location).query_value(subject, flag)
    }

    /// Every applicable value of `flag` at `location`.
    pub fn query_all_values(&self, location: &Location, subject: &Subject, flag: &Flag) -> Vec<FlagValue> {
        self.applicable_regions(location).query_all_values(subject, flag)
    }

    /// The combined state of `flags` at `location`.
    pub fn query_state(&self, location: &Location, subject: &Subject, flags: &[&Flag]) -> Option<State> {
        self.applicable_regions(location).query_state(subject, flags)
    }

    /// Whether the combined state of `flags` at `location` is ALLOW.
    pub fn test_state(&self, location: &Location, subject: &Subject, flags: &[&Flag]) -> bool {
        self.applicable_regions(location).test_state(subject, flags)
    }
}
