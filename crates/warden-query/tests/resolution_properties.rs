//! Resolution over a container must match a brute-force reading of the
//! priority and tie-break rules applied to exactly the containing regions.

use std::sync::Arc;

use proptest::prelude::*;
use warden_query::RegionQuery;
use warden_regions::{Region, RegionContainer, RegionIndex, Shape, Subject};
use warden_types::{
    ActorId, Association, BlockPosition, Flag, FlagKind, FlagValue, Location, RegionGroup, State,
};

#[derive(Debug, Clone)]
struct Plan {
    priority: i32,
    min: (i32, i32, i32),
    size: (i32, i32, i32),
    state: Option<State>,
    text: Option<String>,
    group: Option<RegionGroup>,
    relation: Association,
}

fn plan() -> impl Strategy<Value = Plan> {
    (
        0..4_i32,
        (0..10_i32, 0..10_i32, 0..10_i32),
        (0..10_i32, 0..10_i32, 0..10_i32),
        prop_oneof![Just(None), Just(Some(State::Allow)), Just(Some(State::Deny))],
        prop::option::of("[a-c]{1,2}"),
        prop_oneof![
            Just(None),
            Just(Some(RegionGroup::All)),
            Just(Some(RegionGroup::Members)),
            Just(Some(RegionGroup::NonMembers)),
            Just(Some(RegionGroup::Owners)),
            Just(Some(RegionGroup::None)),
        ],
        prop_oneof![
            Just(Association::Owner),
            Just(Association::Member),
            Just(Association::NonMember)
        ],
    )
        .prop_map(|(priority, min, size, state, text, group, relation)| Plan {
            priority,
            min,
            size,
            state,
            text,
            group,
            relation,
        })
}

fn state_flag() -> Flag {
    Flag::custom("test-state", FlagKind::State)
}

fn text_flag() -> Flag {
    Flag::custom("test-text", FlagKind::Text)
}

fn contains(plan: &Plan, p: (i32, i32, i32)) -> bool {
    let (x, y, z) = p;
    let (mx, my, mz) = plan.min;
    let (sx, sy, sz) = plan.size;
    (mx..=mx + sx).contains(&x) && (my..=my + sy).contains(&y) && (mz..=mz + sz).contains(&z)
}

fn admits(plan: &Plan) -> bool {
    plan.group.unwrap_or(RegionGroup::All).contains(plan.relation)
}

fn build(plans: &[Plan], actor: ActorId) -> RegionIndex {
    let mut index = RegionIndex::new();
    let world = index.world_mut("world");
    for (i, plan) in plans.iter().enumerate() {
        let (mx, my, mz) = plan.min;
        let (sx, sy, sz) = plan.size;
        let shape = Shape::cuboid(
            BlockPosition::new(mx, my, mz),
            BlockPosition::new(mx + sx, my + sy, mz + sz),
        );
        let Ok(region) = Region::new(&format!("r{i}"), shape) else {
            continue;
        };
        let mut region = region.with_priority(plan.priority);
        match plan.relation {
            Association::Owner => region.owners_mut().add_player(actor),
            Association::Member => region.members_mut().add_player(actor),
            Association::NonMember => {}
        }
        if let Some(state) = plan.state {
            assert!(region.set_flag(&state_flag(), FlagValue::State(state)).is_ok());
        }
        if let Some(text) = &plan.text {
            assert!(region.set_flag(&text_flag(), FlagValue::Text(text.clone())).is_ok());
        }
        if let Some(group) = plan.group {
            region.set_group(&state_flag(), group);
            region.set_group(&text_flag(), group);
        }
        assert!(world.insert(region).is_ok());
    }
    index
}

/// Containing regions that yield a value for the subject, with their ids.
fn qualifying<'a>(plans: &'a [Plan], p: (i32, i32, i32)) -> Vec<(usize, &'a Plan)> {
    plans
        .iter()
        .enumerate()
        .filter(|(_, s)| contains(s, p) && admits(s))
        .collect()
}

fn expected_state(plans: &[Plan], p: (i32, i32, i32)) -> Option<State> {
    let candidates: Vec<(usize, &Plan)> = qualifying(plans, p)
        .into_iter()
        .filter(|(_, s)| s.state.is_some())
        .collect();
    let top = candidates.iter().map(|(_, s)| s.priority).max()?;
    let at_top = candidates.iter().filter(|(_, s)| s.priority == top);
    if at_top.clone().any(|(_, s)| s.state == Some(State::Deny)) {
        Some(State::Deny)
    } else {
        Some(State::Allow)
    }
}

fn expected_text(plans: &[Plan], p: (i32, i32, i32)) -> Option<String> {
    qualifying(plans, p)
        .into_iter()
        .filter_map(|(i, s)| s.text.clone().map(|t| (s.priority, format!("r{i}"), t)))
        .min_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, _, t)| t)
}

proptest! {
    #[test]
    fn state_resolution_matches_reference(
        plans in prop::collection::vec(plan(), 1..7),
        p in (0..20_i32, 0..20_i32, 0..20_i32),
    ) {
        let actor = ActorId::new();
        let index = build(&plans, actor);
        let query = RegionQuery::new(Arc::new(index));
        let location = Location::new("world", f64::from(p.0), f64::from(p.1), f64::from(p.2));

        let got = query
            .query_value(&location, &Subject::actor(actor), &state_flag())
            .and_then(|v| v.as_state());
        prop_assert_eq!(got, expected_state(&plans, p));
    }

    #[test]
    fn value_resolution_matches_reference(
        plans in prop::collection::vec(plan(), 1..7),
        p in (0..20_i32, 0..20_i32, 0..20_i32),
    ) {
        let actor = ActorId::new();
        let index = build(&plans, actor);
        let query = RegionQuery::new(Arc::new(index));
        let location = Location::new("world", f64::from(p.0), f64::from(p.1), f64::from(p.2));

        let got = query
            .query_value(&location, &Subject::actor(actor), &text_flag())
            .and_then(|v| v.as_text().map(str::to_owned));
        prop_assert_eq!(got, expected_text(&plans, p));
    }

    #[test]
    fn applicable_set_is_exactly_the_containing_regions(
        plans in prop::collection::vec(plan(), 1..7),
        p in (0..20_i32, 0..20_i32, 0..20_i32),
    ) {
        let index = build(&plans, ActorId::new());
        let found = index.regions_containing("world", BlockPosition::new(p.0, p.1, p.2)).len();
        let expected = plans.iter().filter(|s| contains(s, p)).count();
        prop_assert_eq!(found, expected);
    }
}
