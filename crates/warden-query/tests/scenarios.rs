//! End-to-end resolution scenarios over a region index.

use std::sync::Arc;

use warden_query::RegionQuery;
use warden_regions::{Region, RegionIndex, Shape, Subject};
use warden_types::{ActorId, BlockPosition, FlagValue, Location, State, flags};

/// `World` (priority 0, entry allow) with a nested `Inner` (priority 5,
/// entry deny, parent `World`).
fn world_and_inner(inner_member: Option<ActorId>) -> RegionQuery {
    let mut world = Region::new(
        "World",
        Shape::cuboid(BlockPosition::new(-100, 0, -100), BlockPosition::new(100, 255, 100)),
    )
    .unwrap_or_else(|_| Region::global());
    assert!(world.set_flag(&flags::ENTRY, FlagValue::State(State::Allow)).is_ok());
    let world = Arc::new(world);

    let mut inner = Region::new(
        "Inner",
        Shape::cuboid(BlockPosition::new(0, 0, 0), BlockPosition::new(10, 255, 10)),
    )
    .map(|r| r.with_priority(5))
    .unwrap_or_else(|_| Region::global());
    assert!(inner.set_flag(&flags::ENTRY, FlagValue::State(State::Deny)).is_ok());
    assert!(inner.set_parent(Some(Arc::clone(&world))).is_ok());
    if let Some(member) = inner_member {
        inner.members_mut().add_player(member);
    }

    let mut index = RegionIndex::new();
    let regions = index.world_mut("overworld");
    assert!(regions.insert(Region::clone(&world)).is_ok());
    assert!(regions.insert(inner).is_ok());
    RegionQuery::new(Arc::new(index))
}

#[test]
fn entry_is_denied_inside_inner_for_non_members() {
    let query = world_and_inner(None);
    let stranger = Subject::actor(ActorId::new());
    let inside = Location::new("overworld", 5.5, 64.0, 5.5);
    assert_eq!(
        query.query_state(&inside, &stranger, &[&flags::ENTRY]),
        Some(State::Deny)
    );
}

#[test]
fn entry_is_allowed_in_world_outside_inner() {
    let query = world_and_inner(None);
    let stranger = Subject::actor(ActorId::new());
    let outside = Location::new("overworld", 50.0, 64.0, 50.0);
    assert_eq!(
        query.query_state(&outside, &stranger, &[&flags::ENTRY]),
        Some(State::Allow)
    );
    assert!(query.test_state(&outside, &stranger, &[&flags::ENTRY]));
}

#[test]
fn members_of_inner_are_not_restricted() {
    let member = ActorId::new();
    let query = world_and_inner(Some(member));
    let inside = Location::new("overworld", 5.5, 64.0, 5.5);
    assert!(query.test_state(&inside, &Subject::actor(member), &[&flags::ENTRY]));
}

#[test]
fn inner_region_shadows_its_parent() {
    let query = world_and_inner(None);
    let inside = Location::new("overworld", 5.5, 64.0, 5.5);
    let set = query.applicable_regions(&inside);
    assert_eq!(set.len(), 2);
    assert_eq!(
        set.regions().first().map(|r| r.id().to_owned()),
        Some(String::from("inner"))
    );
    assert_eq!(
        set.query_all_values(&Subject::Console, &flags::ENTRY),
        vec![FlagValue::State(State::Deny)]
    );
}

#[test]
fn unknown_world_resolves_to_defaults() {
    let query = world_and_inner(None);
    let elsewhere = Location::new("nether", 5.0, 64.0, 5.0);
    assert!(query.applicable_regions(&elsewhere).is_empty());
    assert!(query.test_state(&elsewhere, &Subject::Console, &[&flags::ENTRY]));
    assert!(query.query_value(&elsewhere, &Subject::Console, &flags::HEAL_AMOUNT).is_none());
    assert!(query.query_all_values(&elsewhere, &Subject::Console, &flags::GREET_MESSAGE).is_empty());
}
