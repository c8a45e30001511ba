//! The cause chain and its builder.

use std::collections::HashSet;

use warden_types::{ActorId, BlockPosition};

use crate::object::{CauseGraph, CauseKind, CauseObject, ObjectKey};

/// The ordered chain of objects responsible for an event, root first.
///
/// Built fresh for every triggering event and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cause {
    chain: Vec<CauseObject>,
    indirect: bool,
}

impl Cause {
    /// A cause with nothing in it.
    pub const fn unknown() -> Self {
        Self {
            chain: Vec::new(),
            indirect: false,
        }
    }

    /// Build a cause chain from candidate objects.
    ///
    /// Each candidate is expanded depth-first: attached parent causes are
    /// spliced in first (root-most first), then the controller of a
    /// composite object (detonator, shooter, riders, source, target, owner),
    /// then the candidate itself. Every object appears at most once, so
    /// cyclic relations terminate. Following a source, target or owner
    /// relation marks the chain indirect.
    pub fn create<G, I>(graph: &G, candidates: I) -> Self
    where
        G: CauseGraph + ?Sized,
        I: IntoIterator<Item = CauseObject>,
    {
        let mut builder = Builder {
            graph,
            seen: HashSet::new(),
            chain: Vec::new(),
            indirect: false,
        };
        for candidate in candidates {
            builder.add(candidate);
        }
        Self {
            chain: builder.chain,
            indirect: builder.indirect,
        }
    }

    /// Whether anybody can be held responsible.
    ///
    /// False when the chain is empty or holds only transient or
    /// non-attributable objects (a stray fire block, an unowned arrow).
    pub fn is_known(&self) -> bool {
        self.chain.iter().any(CauseObject::is_attributable)
    }

    /// Whether the root did not act directly (a pet, a targeting mob).
    pub const fn is_indirect(&self) -> bool {
        self.indirect
    }

    /// The root-most object.
    pub fn root_cause(&self) -> Option<&CauseObject> {
        self.chain.first()
    }

    /// The first player in the chain.
    pub fn first_player(&self) -> Option<ActorId> {
        self.chain.iter().find_map(|o| match o {
            CauseObject::Player(id) => Some(*id),
            _ => None,
        })
    }

    /// The first non-player entity in the chain.
    pub fn first_entity(&self) -> Option<&CauseObject> {
        self.find(&[CauseKind::Entity])
    }

    /// The position of the first block in the chain.
    pub fn first_block(&self) -> Option<BlockPosition> {
        self.chain.iter().find_map(|o| match o {
            CauseObject::Block { position, .. } => Some(*position),
            _ => None,
        })
    }

    /// The first object whose category is one of `kinds`.
    pub fn find(&self, kinds: &[CauseKind]) -> Option<&CauseObject> {
        self.chain.iter().find(|o| kinds.contains(&o.kind()))
    }

    /// Whether any object in the chain is of the given category.
    pub fn contains_kind(&self, kind: CauseKind) -> bool {
        self.chain.iter().any(|o| o.kind() == kind)
    }

    /// The chain, root first.
    pub fn objects(&self) -> &[CauseObject] {
        &self.chain
    }

    /// Number of objects in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

impl core::fmt::Display for Cause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.chain.is_empty() {
            return f.write_str("unknown");
        }
        for (i, object) in self.chain.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{object}")?;
        }
        if self.indirect {
            f.write_str(" [indirect]")?;
        }
        Ok(())
    }
}

struct Builder<'g, G: ?Sized> {
    graph: &'g G,
    seen: HashSet<ObjectKey>,
    chain: Vec<CauseObject>,
    indirect: bool,
}

impl<G: CauseGraph + ?Sized> Builder<'_, G> {
    fn add(&mut self, object: CauseObject) {
        if !self.seen.insert(object.key()) {
            return;
        }

        // Attached parent causes, oldest ending up first.
        let index = self.chain.len();
        let mut source = object.clone();
        while let Some(parent) = self.graph.parent_cause(&source) {
            if !self.seen.insert(parent.key()) {
                break;
            }
            self.chain.insert(index, parent.clone());
            source = parent;
        }

        if let Some(controller) = self.graph.controller(&object) {
            if controller.is_indirect() {
                self.indirect = true;
            }
            for controlling in controller.into_objects() {
                self.add(controlling);
            }
        }

        self.chain.push(object);
    }
}

#[cfg(test)]
mod tests {
    use warden_types::EntityId;

    use super::*;
    use crate::object::{Controller, EntityKind, InMemoryCauseGraph, NoRelations};

    #[test]
    fn projectile_chain_starts_with_shooter() {
        let mut graph = InMemoryCauseGraph::new();
        let player = CauseObject::Player(ActorId::new());
        let arrow = CauseObject::entity(EntityId::new(), EntityKind::Projectile);
        graph.set_controller(&arrow, Controller::Shooter(player.clone()));

        let cause = Cause::create(&graph, [arrow.clone()]);
        assert_eq!(cause.objects(), &[player, arrow]);
        assert!(!cause.is_indirect());
        assert!(cause.is_known());
    }

    #[test]
    fn pet_chain_is_indirect() {
        let mut graph = InMemoryCauseGraph::new();
        let owner = ActorId::new();
        let wolf = CauseObject::entity(EntityId::new(), EntityKind::Tameable);
        graph.set_controller(&wolf, Controller::Owner(CauseObject::Player(owner)));

        let cause = Cause::create(&graph, [wolf]);
        assert!(cause.is_indirect());
        assert_eq!(cause.first_player(), Some(owner));
        assert_eq!(cause.root_cause(), Some(&CauseObject::Player(owner)));
    }

    #[test]
    fn duplicate_candidates_are_collapsed() {
        let player = CauseObject::Player(ActorId::new());
        let cause = Cause::create(&NoRelations, [player.clone(), player.clone(), player]);
        assert_eq!(cause.len(), 1);
    }

    #[test]
    fn mutual_control_terminates() {
        let mut graph = InMemoryCauseGraph::new();
        let a = CauseObject::entity(EntityId::new(), EntityKind::Creature);
        let b = CauseObject::entity(EntityId::new(), EntityKind::Creature);
        graph.set_controller(&a, Controller::Target(b.clone()));
        graph.set_controller(&b, Controller::Target(a.clone()));

        let cause = Cause::create(&graph, [a.clone()]);
        assert_eq!(cause.objects(), &[b, a]);
        assert!(cause.is_indirect());
    }

    #[test]
    fn parent_causes_are_spliced_root_first() {
        let mut graph = InMemoryCauseGraph::new();
        let player = CauseObject::Player(ActorId::new());
        let dispenser_arrow = CauseObject::entity(EntityId::new(), EntityKind::Other);
        let falling = CauseObject::entity(EntityId::new(), EntityKind::Other);
        graph.attach_parent_cause(&falling, dispenser_arrow.clone());
        graph.attach_parent_cause(&dispenser_arrow, player.clone());

        let cause = Cause::create(&graph, [falling.clone()]);
        assert_eq!(cause.objects(), &[player, dispenser_arrow, falling]);
    }

    #[test]
    fn cyclic_parent_metadata_terminates() {
        let mut graph = InMemoryCauseGraph::new();
        let a = CauseObject::entity(EntityId::new(), EntityKind::Other);
        let b = CauseObject::entity(EntityId::new(), EntityKind::Other);
        graph.attach_parent_cause(&a, b.clone());
        graph.attach_parent_cause(&b, a.clone());

        let cause = Cause::create(&graph, [a.clone()]);
        assert_eq!(cause.objects(), &[b, a]);
    }

    #[test]
    fn vehicle_expands_every_rider() {
        let mut graph = InMemoryCauseGraph::new();
        let p1 = CauseObject::Player(ActorId::new());
        let p2 = CauseObject::Player(ActorId::new());
        let boat = CauseObject::entity(EntityId::new(), EntityKind::Vehicle);
        graph.set_controller(&boat, Controller::Riders(vec![p1.clone(), p2.clone()]));

        let cause = Cause::create(&graph, [boat.clone()]);
        assert_eq!(cause.objects(), &[p1, p2, boat]);
        assert!(!cause.is_indirect());
    }

    #[test]
    fn fire_alone_is_unknown() {
        let fire = CauseObject::block(BlockPosition::new(4, 64, 4), "fire", false);
        let cause = Cause::create(&NoRelations, [fire]);
        assert!(!cause.is_known());
        assert_eq!(cause.first_block(), Some(BlockPosition::new(4, 64, 4)));
    }

    #[test]
    fn empty_cause_is_unknown() {
        assert!(!Cause::unknown().is_known());
        assert!(Cause::unknown().root_cause().is_none());
        assert_eq!(Cause::unknown().to_string(), "unknown");
    }

    #[test]
    fn find_returns_first_matching_kind() {
        let player = CauseObject::Player(ActorId::new());
        let block = CauseObject::block(BlockPosition::new(0, 0, 0), "piston", true);
        let cause = Cause::create(&NoRelations, [block.clone(), player]);
        assert_eq!(cause.find(&[CauseKind::Player, CauseKind::Block]), Some(&block));
        assert!(cause.first_entity().is_none());
        assert!(cause.contains_kind(CauseKind::Player));
    }

    #[test]
    fn display_marks_indirect_chains() {
        let mut graph = InMemoryCauseGraph::new();
        let wolf = CauseObject::entity(EntityId::new(), EntityKind::Tameable);
        graph.set_controller(&wolf, Controller::Owner(CauseObject::Automation(String::from("npc"))));
        let text = Cause::create(&graph, [wolf]).to_string();
        assert!(text.starts_with("automation:npc | entity:Tameable:"));
        assert!(text.ends_with("[indirect]"));
    }
}
