//! The set of regions applying at one point.

use std::collections::BTreeSet;
use std::sync::Arc;

use warden_regions::{Region, Subject};
use warden_types::{Association, BlockPosition, Flag, FlagValue, State};

use crate::calculator::{choose_value, contributions, effective_value};

/// The regions containing a point, plus the world's global region.
///
/// Regions are kept sorted by priority descending, then by id ascending;
/// every query walks them in that order. The set is a snapshot: it is
/// recomputed per query and never updated.
#[derive(Debug, Clone)]
pub struct ApplicableRegionSet {
    world: String,
    point: BlockPosition,
    regions: Vec<Arc<Region>>,
    global: Option<Arc<Region>>,
}

impl ApplicableRegionSet {
    /// Build a set from the regions containing `point`.
    pub fn new(
        world: impl Into<String>,
        point: BlockPosition,
        mut regions: Vec<Arc<Region>>,
        global: Option<Arc<Region>>,
    ) -> Self {
        regions.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| a.id().cmp(b.id()))
        });
        regions.dedup_by(|a, b| a.id() == b.id());
        Self {
            world: world.into(),
            point,
            regions,
            global,
        }
    }

    /// A set with no regions and no global region.
    pub fn empty(world: impl Into<String>, point: BlockPosition) -> Self {
        Self::new(world, point, Vec::new(), None)
    }

    /// The world queried.
    pub fn world(&self) -> &str {
        &self.world
    }

    /// The block queried.
    pub const fn point(&self) -> BlockPosition {
        self.point
    }

    /// The placed regions, in resolution order.
    pub fn regions(&self) -> &[Arc<Region>] {
        &self.regions
    }

    /// The world's global region.
    pub const fn global(&self) -> Option<&Arc<Region>> {
        self.global.as_ref()
    }

    /// Normalized ids of the placed regions.
    pub fn region_ids(&self) -> BTreeSet<&str> {
        self.regions.iter().map(|r| r.id()).collect()
    }

    /// Whether a region with this id is in the set.
    pub fn contains_id(&self, id: &str) -> bool {
        self.regions.iter().any(|r| r.id().eq_ignore_ascii_case(id))
    }

    /// Number of placed regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no placed region contains the point.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions in `self` that are not in `other`, compared by id.
    pub fn difference<'a>(&'a self, other: &Self) -> Vec<&'a Arc<Region>> {
        self.regions
            .iter()
            .filter(|r| !other.contains_id(r.id()))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The effective value of `flag` for `subject`.
    ///
    /// Falls back to the global region, then to the flag's default.
    pub fn query_value(&self, subject: &Subject, flag: &Flag) -> Option<FlagValue> {
        let found = contributions(&self.regions, subject, flag, true);
        choose_value(flag, &found)
            .or_else(|| self.global_value(subject, flag))
            .or_else(|| flag.default_value().cloned())
    }

    /// Every value of `flag` that applies to `subject`, in resolution
    /// order, without a priority cut-off.
    ///
    /// When no placed region yields a value the global region's value is
    /// returned on its own. Flag defaults are not included.
    pub fn query_all_values(&self, subject: &Subject, flag: &Flag) -> Vec<FlagValue> {
        let found: Vec<FlagValue> = contributions(&self.regions, subject, flag, false)
            .into_iter()
            .map(|c| c.value.clone())
            .collect();
        if found.is_empty() {
            return self.global_value(subject, flag).into_iter().collect();
        }
        found
    }

    /// Combine several state flags; DENY from any of them wins.
    pub fn query_state(&self, subject: &Subject, flags: &[&Flag]) -> Option<State> {
        State::combine(
            flags
                .iter()
                .map(|flag| self.query_value(subject, flag).and_then(|v| v.as_state())),
        )
    }

    /// Whether the combined state of `flags` is ALLOW.
    pub fn test_state(&self, subject: &Subject, flags: &[&Flag]) -> bool {
        self.query_state(subject, flags) == Some(State::Allow)
    }

    /// The subject's weakest relation across every placed region.
    ///
    /// An empty set, or any region the subject has no part in, yields
    /// [`Association::NonMember`].
    pub fn membership(&self, subject: &Subject) -> Association {
        self.regions
            .iter()
            .map(|r| subject.association(r))
            .max()
            .unwrap_or(Association::NonMember)
    }

    /// Whether the subject owns every placed region (and there is one).
    pub fn is_owner_of_all(&self, subject: &Subject) -> bool {
        !self.regions.is_empty() && self.membership(subject) == Association::Owner
    }

    /// Whether the subject is a member of every placed region (and there
    /// is one).
    pub fn is_member_of_all(&self, subject: &Subject) -> bool {
        !self.regions.is_empty() && self.membership(subject) <= Association::Member
    }

    fn global_value(&self, subject: &Subject, flag: &Flag) -> Option<FlagValue> {
        self.global
            .as_deref()
            .and_then(|g| effective_value(g, flag, subject))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use warden_regions::Shape;
    use warden_types::{ActorId, RegionGroup, flags};

    use super::*;

    fn region(id: &str, priority: i32) -> Region {
        Region::new(id, Shape::cuboid(BlockPosition::new(0, 0, 0), BlockPosition::new(1, 1, 1)))
            .map(|r| r.with_priority(priority))
            .unwrap_or_else(|_| Region::global())
    }

    fn with(mut region: Region, flag: &Flag, value: FlagValue) -> Arc<Region> {
        assert!(region.set_flag(flag, value).is_ok());
        Arc::new(region)
    }

    fn set(regions: Vec<Arc<Region>>) -> ApplicableRegionSet {
        ApplicableRegionSet::new("world", BlockPosition::new(0, 0, 0), regions, None)
    }

    fn text(s: &str) -> FlagValue {
        FlagValue::Text(s.to_owned())
    }

    #[test]
    fn regions_are_sorted_by_priority_then_id() {
        let s = set(vec![
            Arc::new(region("b", 1)),
            Arc::new(region("c", 5)),
            Arc::new(region("a", 1)),
        ]);
        let ids: Vec<&str> = s.regions().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn deny_wins_at_equal_priority_in_any_order() {
        let allow = with(region("a", 3), &flags::ENTRY, FlagValue::State(State::Allow));
        let deny = with(region("b", 3), &flags::ENTRY, FlagValue::State(State::Deny));
        let forward = set(vec![Arc::clone(&allow), Arc::clone(&deny)]);
        let backward = set(vec![deny, allow]);
        for s in [forward, backward] {
            assert_eq!(
                s.query_value(&Subject::Console, &flags::ENTRY),
                Some(FlagValue::State(State::Deny))
            );
        }
    }

    #[test]
    fn higher_priority_allow_beats_lower_deny() {
        let s = set(vec![
            with(region("low", 0), &flags::ENTRY, FlagValue::State(State::Deny)),
            with(region("high", 1), &flags::ENTRY, FlagValue::State(State::Allow)),
        ]);
        assert!(s.test_state(&Subject::Console, &[&flags::ENTRY]));
    }

    #[test]
    fn value_tie_resolves_to_smallest_id() {
        let s = set(vec![
            with(region("zeta", 2), &flags::GREET_MESSAGE, text("z")),
            with(region("alpha", 2), &flags::GREET_MESSAGE, text("a")),
        ]);
        assert_eq!(s.query_value(&Subject::Console, &flags::GREET_MESSAGE), Some(text("a")));
    }

    #[test]
    fn group_restricted_value_skips_outsiders() {
        let member = ActorId::new();
        let mut inner = region("inner", 5);
        inner.members_mut().add_player(member);
        inner.set_group(&flags::GREET_MESSAGE, RegionGroup::Members);
        let s = set(vec![
            with(inner, &flags::GREET_MESSAGE, text("members only")),
            with(region("outer", 0), &flags::GREET_MESSAGE, text("everyone")),
        ]);
        assert_eq!(s.query_value(&Subject::actor(member), &flags::GREET_MESSAGE), Some(text("members only")));
        assert_eq!(s.query_value(&Subject::actor(ActorId::new()), &flags::GREET_MESSAGE), Some(text("everyone")));
    }

    #[test]
    fn global_then_default_are_fallbacks() {
        let mut global = Region::global();
        assert!(global.set_flag(&flags::GREET_MESSAGE, text("hello world")).is_ok());
        let s = ApplicableRegionSet::new("world", BlockPosition::new(0, 0, 0), Vec::new(), Some(Arc::new(global)));
        assert_eq!(s.query_value(&Subject::Console, &flags::GREET_MESSAGE), Some(text("hello world")));
        assert_eq!(s.query_all_values(&Subject::Console, &flags::GREET_MESSAGE), vec![text("hello world")]);

        let empty = ApplicableRegionSet::empty("world", BlockPosition::new(0, 0, 0));
        assert_eq!(
            empty.query_value(&Subject::Console, &flags::EXIT),
            Some(FlagValue::State(State::Allow))
        );
        assert!(empty.query_value(&Subject::Console, &flags::INVINCIBILITY).is_none());
        assert!(empty.query_all_values(&Subject::Console, &flags::GREET_MESSAGE).is_empty());
    }

    #[test]
    fn all_values_ignore_priority_cut_off() {
        let s = set(vec![
            with(region("a", 9), &flags::FAREWELL_MESSAGE, text("bye a")),
            with(region("b", 1), &flags::FAREWELL_MESSAGE, text("bye b")),
        ]);
        assert_eq!(
            s.query_all_values(&Subject::Console, &flags::FAREWELL_MESSAGE),
            vec![text("bye a"), text("bye b")]
        );
    }

    #[test]
    fn query_state_combines_several_flags() {
        let s = set(vec![
            with(region("a", 0), &flags::ENTRY, FlagValue::State(State::Allow)),
            with(region("b", 0), &flags::EXIT, FlagValue::State(State::Deny)),
        ]);
        assert_eq!(
            s.query_state(&Subject::Console, &[&flags::ENTRY, &flags::EXIT]),
            Some(State::Deny)
        );
        assert!(!s.test_state(&Subject::Console, &[&flags::ENTRY, &flags::EXIT]));
        assert!(s.test_state(&Subject::Console, &[&flags::ENTRY]));
    }

    #[test]
    fn membership_is_weakest_relation() {
        let actor = ActorId::new();
        let mut owned = region("owned", 0);
        owned.owners_mut().add_player(actor);
        let mut joined = region("joined", 0);
        joined.members_mut().add_player(actor);
        let s = set(vec![Arc::new(owned), Arc::new(joined)]);
        assert_eq!(s.membership(&Subject::actor(actor)), Association::Member);
        assert!(s.is_member_of_all(&Subject::actor(actor)));
        assert!(!s.is_owner_of_all(&Subject::actor(actor)));
        assert_eq!(s.membership(&Subject::Console), Association::NonMember);
    }

    #[test]
    fn difference_compares_ids() {
        let a = Arc::new(region("a", 0));
        let b = Arc::new(region("b", 0));
        let from = set(vec![Arc::clone(&a), Arc::clone(&b)]);
        let to = set(vec![b]);
        let exited: Vec<&str> = from.difference(&to).iter().map(|r| r.id()).collect();
        assert_eq!(exited, vec!["a"]);
        assert!(to.difference(&from).is_empty());
    }
}
