//! Objects that can appear in a cause chain and the relations between them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use warden_types::{ActorId, BlockPosition, EntityId};

/// What sort of non-player entity an object is.
///
/// The kind decides which controller relation the builder follows and
/// whether the entity can be held responsible on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A lit explosive; controlled by whoever detonated it.
    PrimedExplosive,
    /// An arrow, snowball, trident...; controlled by its shooter.
    Projectile,
    /// A launched firework; controlled by its shooter.
    Firework,
    /// A lingering potion cloud; controlled by its source.
    AreaEffectCloud,
    /// A boat, minecart or mount; controlled by its riders.
    Vehicle,
    /// A hostile or neutral creature; acts on behalf of its target.
    Creature,
    /// A pet; acts on behalf of its owner.
    Tameable,
    /// Anything else.
    Other,
}

impl EntityKind {
    /// Transient entities exist only as the means of somebody else's action
    /// and are never attributable on their own.
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::PrimedExplosive | Self::Projectile | Self::Firework | Self::AreaEffectCloud
        )
    }
}

/// Something that may have caused an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CauseObject {
    /// A connected actor.
    Player(ActorId),
    /// A non-player entity.
    Entity {
        /// Stable identity of the entity.
        id: EntityId,
        /// What sort of entity it is.
        kind: EntityKind,
    },
    /// A block in the world.
    Block {
        /// Where the block is.
        position: BlockPosition,
        /// Material name, for display.
        material: String,
        /// Whether the block can be held responsible (false for fire, lava
        /// and other unowned combustibles).
        attributable: bool,
    },
    /// An automated source such as a plugin or a scheduled task.
    Automation(String),
}

/// The category of a [`CauseObject`], used by [`crate::Cause::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CauseKind {
    /// [`CauseObject::Player`].
    Player,
    /// [`CauseObject::Entity`].
    Entity,
    /// [`CauseObject::Block`].
    Block,
    /// [`CauseObject::Automation`].
    Automation,
}

/// Identity of a cause object, used for deduplication.
///
/// Blocks are identified by position only; players and entities by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectKey {
    /// Player identity.
    Player(ActorId),
    /// Entity identity.
    Entity(EntityId),
    /// Block identity.
    Block(BlockPosition),
    /// Automation identity.
    Automation(String),
}

impl CauseObject {
    /// Shorthand for a non-player entity.
    pub const fn entity(id: EntityId, kind: EntityKind) -> Self {
        Self::Entity { id, kind }
    }

    /// Shorthand for a block.
    pub fn block(position: BlockPosition, material: impl Into<String>, attributable: bool) -> Self {
        Self::Block {
            position,
            material: material.into(),
            attributable,
        }
    }

    /// The identity used for deduplication.
    pub fn key(&self) -> ObjectKey {
        match self {
            Self::Player(id) => ObjectKey::Player(*id),
            Self::Entity { id, .. } => ObjectKey::Entity(*id),
            Self::Block { position, .. } => ObjectKey::Block(*position),
            Self::Automation(name) => ObjectKey::Automation(name.to_ascii_lowercase()),
        }
    }

    /// The category of this object.
    pub const fn kind(&self) -> CauseKind {
        match self {
            Self::Player(_) => CauseKind::Player,
            Self::Entity { .. } => CauseKind::Entity,
            Self::Block { .. } => CauseKind::Block,
            Self::Automation(_) => CauseKind::Automation,
        }
    }

    /// Whether this object can be blamed for an event by itself.
    pub const fn is_attributable(&self) -> bool {
        match self {
            Self::Player(_) | Self::Automation(_) => true,
            Self::Entity { kind, .. } => !kind.is_transient(),
            Self::Block { attributable, .. } => *attributable,
        }
    }

    /// Whether the object can carry attached parent-cause metadata.
    ///
    /// Blocks are places rather than things and never do.
    pub const fn carries_metadata(&self) -> bool {
        !matches!(self, Self::Block { .. })
    }
}

impl core::fmt::Display for CauseObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Player(id) => write!(f, "player:{id}"),
            Self::Entity { id, kind } => write!(f, "entity:{kind:?}:{id}"),
            Self::Block {
                position, material, ..
            } => write!(f, "block:{material}@{position}"),
            Self::Automation(name) => write!(f, "automation:{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Controllers
// ---------------------------------------------------------------------------

/// Who is behind a composite object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controller {
    /// The actor who lit an explosive.
    Detonator(CauseObject),
    /// Whoever fired a projectile or firework.
    Shooter(CauseObject),
    /// Everyone riding a vehicle.
    Riders(Vec<CauseObject>),
    /// Whoever released an area effect.
    Source(CauseObject),
    /// The creature's current target.
    Target(CauseObject),
    /// The pet's owner.
    Owner(CauseObject),
}

impl Controller {
    /// Whether following this relation means the root did not act directly.
    pub const fn is_indirect(&self) -> bool {
        matches!(self, Self::Source(_) | Self::Target(_) | Self::Owner(_))
    }

    /// The objects behind the relation.
    pub fn into_objects(self) -> Vec<CauseObject> {
        match self {
            Self::Riders(riders) => riders,
            Self::Detonator(o) | Self::Shooter(o) | Self::Source(o) | Self::Target(o) | Self::Owner(o) => {
                vec![o]
            }
        }
    }
}

/// Read access to the host's object graph.
pub trait CauseGraph {
    /// The controller relation of a composite object, if any.
    fn controller(&self, object: &CauseObject) -> Option<Controller>;

    /// The parent cause attached to the object as transient metadata.
    fn parent_cause(&self, object: &CauseObject) -> Option<CauseObject>;
}

/// A graph with no relations at all; every object stands alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelations;

impl CauseGraph for NoRelations {
    fn controller(&self, _object: &CauseObject) -> Option<Controller> {
        None
    }

    fn parent_cause(&self, _object: &CauseObject) -> Option<CauseObject> {
        None
    }
}

/// An in-memory object graph for hosts that track relations themselves.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCauseGraph {
    controllers: HashMap<ObjectKey, Controller>,
    parents: HashMap<ObjectKey, CauseObject>,
}

impl InMemoryCauseGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the controller of a composite object, replacing any previous one.
    pub fn set_controller(&mut self, object: &CauseObject, controller: Controller) {
        self.controllers.insert(object.key(), controller);
    }

    /// Attach a parent cause to an object so later chains built from it
    /// start with the parent.
    ///
    /// Ignored for blocks, which cannot carry metadata.
    pub fn attach_parent_cause(&mut self, object: &CauseObject, parent: CauseObject) {
        if object.carries_metadata() {
            self.parents.insert(object.key(), parent);
        }
    }

    /// Forget everything known about an object (it despawned).
    pub fn remove(&mut self, object: &CauseObject) {
        let key = object.key();
        self.controllers.remove(&key);
        self.parents.remove(&key);
    }
}

impl CauseGraph for InMemoryCauseGraph {
    fn controller(&self, object: &CauseObject) -> Option<Controller> {
        self.controllers.get(&object.key()).cloned()
    }

    fn parent_cause(&self, object: &CauseObject) -> Option<CauseObject> {
        if !object.carries_metadata() {
            return None;
        }
        self.parents.get(&object.key()).cloned()
    }
}
