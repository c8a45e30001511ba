//! The flag value calculator.
//!
//! Given the regions containing a point, already sorted by priority
//! descending then id ascending, computes the values of a flag that apply
//! to a subject. Rules:
//!
//! - A region's value for a flag is the first value found walking
//!   region, parent, grandparent... whose companion group admits the
//!   subject. The subject's association is always taken relative to the
//!   region being evaluated, so a parent's value applies to the child's
//!   owners and members. Inheritance never lends the parent's priority.
//! - Any region in the set shadows its ancestors: an ancestor that is also
//!   in the set does not contribute independently.
//! - With a priority cut-off, only regions at the highest priority that
//!   yields a value contribute.

use std::collections::HashSet;
use std::sync::Arc;

use warden_regions::{Region, Subject};
use warden_types::{Flag, FlagValue, RegionGroup, State};

/// The value a single region contributes for `flag`, following its parent
/// chain and applying the companion group filter.
pub fn effective_value<'r>(region: &'r Region, flag: &Flag, subject: &Subject) -> Option<&'r FlagValue> {
    let mut cached = None;
    for level in region.lineage() {
        let Some(value) = level.flag_value(flag) else {
            continue;
        };
        let group = level
            .group_for(flag)
            .or_else(|| flag.default_group())
            .unwrap_or(RegionGroup::All);
        let association = *cached.get_or_insert_with(|| subject.association(region));
        if group.contains(association) {
            return Some(value);
        }
    }
    None
}

/// One region's contribution to a query.
#[derive(Debug, Clone)]
pub struct Contribution<'a> {
    /// The region whose lineage supplied the value.
    pub region: &'a Arc<Region>,
    /// The value.
    pub value: &'a FlagValue,
}

/// Every contribution for `flag`, in region order.
///
/// When `cut_off` is set, stops after the highest priority level that
/// yields a value.
pub fn contributions<'a>(
    regions: &'a [Arc<Region>],
    subject: &Subject,
    flag: &Flag,
    cut_off: bool,
) -> Vec<Contribution<'a>> {
    let shadowed: HashSet<&str> = regions
        .iter()
        .flat_map(|r| r.ancestors().map(Region::id))
        .collect();

    let mut out: Vec<Contribution<'a>> = Vec::new();
    let mut top_priority: Option<i32> = None;

    for region in regions {
        if let Some(top) = top_priority {
            if cut_off && region.priority() < top {
                break;
            }
        }
        if shadowed.contains(region.id()) {
            continue;
        }
        if let Some(value) = effective_value(region, flag, subject) {
            top_priority.get_or_insert(region.priority());
            out.push(Contribution { region, value });
        }
    }

    out
}

/// Collapse contributions into a single value.
///
/// State flags combine with DENY winning; other flags take the first
/// contribution (highest priority, then lowest region id).
pub fn choose_value(flag: &Flag, contributions: &[Contribution<'_>]) -> Option<FlagValue> {
    if flag.is_state() {
        State::combine(contributions.iter().map(|c| c.value.as_state())).map(FlagValue::State)
    } else {
        contributions.first().map(|c| c.value.clone())
    }
}
