//! Building worlds from serialized region definitions.

use warden_regions::{RegionContainer, RegionDefinition, RegionIndex, Subject, WorldRegions};
use warden_types::{ActorId, Association, BlockPosition, FlagRegistry, FlagValue, RegionGroup, flags};

fn town_json(mayor: ActorId) -> String {
    format!(
        r#"[
            {{ "id": "__global__", "flags": {{ "greeting": "Welcome to the world" }} }},
            {{
                "id": "Town",
                "priority": 1,
                "owners": {{ "players": ["{mayor}"] }},
                "members": {{ "groups": ["Citizens"] }},
                "flags": {{ "greeting": "Welcome to town", "greeting-group": "members" }},
                "shape": {{ "type": "cuboid", "min": {{"x": 0, "y": 0, "z": 0}}, "max": {{"x": 99, "y": 255, "z": 99}} }}
            }},
            {{
                "id": "market",
                "priority": 5,
                "parent": "town",
                "flags": {{ "heal-amount": 2, "heal-delay": 1, "heal-max-health": 18 }},
                "shape": {{ "type": "polygon", "points": [[10, 10], [30, 10], [30, 30], [10, 30]], "min_y": 0, "max_y": 128 }}
            }}
        ]"#
    )
}

fn load(mayor: ActorId) -> Option<WorldRegions> {
    let definitions: Vec<RegionDefinition> = serde_json::from_str(&town_json(mayor)).ok()?;
    WorldRegions::from_definitions(&definitions, &FlagRegistry::with_builtin()).ok()
}

#[test]
fn definitions_build_a_complete_world() {
    let mayor = ActorId::new();
    let world = load(mayor);
    assert!(world.is_some());
    let world = world.unwrap_or_default();

    assert_eq!(world.len(), 2);
    assert!(world.global().is_some());

    let market = world.get("MARKET");
    assert_eq!(market.map(|m| m.priority()), Some(5));
    assert_eq!(
        market.and_then(|m| m.flag_value(&flags::MAX_HEAL).cloned()),
        Some(FlagValue::Double(18.0))
    );
    assert_eq!(
        world.get("town").and_then(|t| t.group_for(&flags::GREET_MESSAGE)),
        Some(RegionGroup::Members)
    );
}

#[test]
fn parent_domains_apply_to_children() {
    let mayor = ActorId::new();
    let world = load(mayor).unwrap_or_default();
    let Some(market) = world.get("market") else {
        return;
    };

    assert_eq!(Subject::actor(mayor).association(market), Association::Owner);

    let citizen = Subject::Actor {
        id: ActorId::new(),
        groups: vec![String::from("citizens")],
    };
    assert_eq!(citizen.association(market), Association::Member);
    assert_eq!(Subject::Console.association(market), Association::NonMember);
}

#[test]
fn index_answers_containment_per_world() {
    let mayor = ActorId::new();
    let mut index = RegionIndex::new();
    index.insert_world("overworld", load(mayor).unwrap_or_default());

    let mut inside_market: Vec<String> = index
        .regions_containing("overworld", BlockPosition::new(20, 64, 20))
        .iter()
        .map(|r| r.id().to_owned())
        .collect();
    inside_market.sort();
    assert_eq!(inside_market, vec![String::from("market"), String::from("town")]);

    let town_only = index.regions_containing("overworld", BlockPosition::new(50, 64, 50));
    assert_eq!(town_only.len(), 1);
    assert!(index.global_region("overworld").is_some());
}
