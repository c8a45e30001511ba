//! Region definitions and the reference region container.
//!
//! Region storage and spatial indexing belong to the host. The core only
//! needs [`RegionContainer`]; [`RegionIndex`] is a linear-scan
//! implementation assembled from serde [`RegionDefinition`]s, good enough
//! for tests and small deployments.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_types::{BlockPosition, FlagLiteral, FlagRegistry};

use crate::domain::Domain;
use crate::error::RegionError;
use crate::region::{GLOBAL_REGION_ID, Region};
use crate::shape::Shape;

/// Answers "which regions contain this point".
pub trait RegionContainer: Send + Sync {
    /// Every placed region of `world` containing `point`, in no particular
    /// order. The global region is never included.
    fn regions_containing(&self, world: &str, point: BlockPosition) -> Vec<Arc<Region>>;

    /// The global region of `world`, if one is defined.
    fn global_region(&self, world: &str) -> Option<Arc<Region>>;
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A region as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDefinition {
    /// Region identifier. `__global__` defines the world's global region.
    pub id: String,
    /// Priority; higher wins.
    #[serde(default)]
    pub priority: i32,
    /// Identifier of the parent region in the same world.
    #[serde(default)]
    pub parent: Option<String>,
    /// Owners domain.
    #[serde(default)]
    pub owners: Domain,
    /// Members domain.
    #[serde(default)]
    pub members: Domain,
    /// Flag values and companion group values keyed by flag name.
    #[serde(default)]
    pub flags: BTreeMap<String, FlagLiteral>,
    /// Geometry. Defaults to [`Shape::Global`].
    #[serde(default = "default_shape")]
    pub shape: Shape,
}

const fn default_shape() -> Shape {
    Shape::Global
}

impl RegionDefinition {
    /// A definition with no parent, domains or flags.
    pub fn new(id: impl Into<String>, shape: Shape) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            parent: None,
            owners: Domain::new(),
            members: Domain::new(),
            flags: BTreeMap::new(),
            shape,
        }
    }

    fn is_global(&self) -> bool {
        self.id.eq_ignore_ascii_case(GLOBAL_REGION_ID)
    }
}

// ---------------------------------------------------------------------------
// WorldRegions
// ---------------------------------------------------------------------------

/// All regions of a single world.
#[derive(Debug, Clone, Default)]
pub struct WorldRegions {
    regions: BTreeMap<String, Arc<Region>>,
    global: Option<Arc<Region>>,
}

impl WorldRegions {
    /// Build a world's regions from definitions.
    ///
    /// Parents are built before their children. Flag entries are checked
    /// against `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::DuplicateRegion`] for repeated ids,
    /// [`RegionError::UnknownParent`] for dangling parents,
    /// [`RegionError::CircularInheritance`] for parent cycles, and
    /// [`RegionError::Flag`] for bad flag entries.
    pub fn from_definitions(
        definitions: &[RegionDefinition],
        registry: &FlagRegistry,
    ) -> Result<Self, RegionError> {
        let mut by_id: HashMap<String, &RegionDefinition> = HashMap::new();
        let mut global = None;

        for definition in definitions {
            if definition.is_global() {
                if global.is_some() {
                    return Err(RegionError::DuplicateRegion(GLOBAL_REGION_ID.to_owned()));
                }
                global = Some(Arc::new(build_global(definition, registry)?));
                continue;
            }
            let key = definition.id.to_ascii_lowercase();
            if by_id.insert(key, definition).is_some() {
                return Err(RegionError::DuplicateRegion(definition.id.clone()));
            }
        }

        let mut builder = Builder {
            definitions: &by_id,
            registry,
            built: BTreeMap::new(),
            visiting: HashSet::new(),
        };
        // Sorted so errors are reported deterministically.
        let mut ids: Vec<&String> = by_id.keys().collect();
        ids.sort();
        for id in ids {
            builder.build(id)?;
        }

        debug!(
            regions = builder.built.len(),
            has_global = global.is_some(),
            "built world regions"
        );
        Ok(Self {
            regions: builder.built,
            global,
        })
    }

    /// Add an already-built region.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::DuplicateRegion`] if the id is taken.
    pub fn insert(&mut self, region: Region) -> Result<Arc<Region>, RegionError> {
        if region.is_global() {
            let region = Arc::new(region);
            self.global = Some(Arc::clone(&region));
            return Ok(region);
        }
        if self.regions.contains_key(region.id()) {
            return Err(RegionError::DuplicateRegion(region.id().to_owned()));
        }
        let region = Arc::new(region);
        self.regions
            .insert(region.id().to_owned(), Arc::clone(&region));
        Ok(region)
    }

    /// Look up a region by id (case-insensitive).
    pub fn get(&self, id: &str) -> Option<&Arc<Region>> {
        if id.eq_ignore_ascii_case(GLOBAL_REGION_ID) {
            return self.global.as_ref();
        }
        self.regions.get(&id.to_ascii_lowercase())
    }

    /// Every placed region, in id order.
    pub fn regions(&self) -> impl Iterator<Item = &Arc<Region>> {
        self.regions.values()
    }

    /// The global region, if defined.
    pub const fn global(&self) -> Option<&Arc<Region>> {
        self.global.as_ref()
    }

    /// Number of placed regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether there are no placed regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn build_global(
    definition: &RegionDefinition,
    registry: &FlagRegistry,
) -> Result<Region, RegionError> {
    if definition.parent.is_some() {
        return Err(RegionError::GlobalWithParent(definition.id.clone()));
    }
    let mut region = Region::global().with_priority(definition.priority);
    fill(&mut region, definition, registry)?;
    Ok(region)
}

fn fill(
    region: &mut Region,
    definition: &RegionDefinition,
    registry: &FlagRegistry,
) -> Result<(), RegionError> {
    *region.owners_mut() = definition.owners.clone();
    *region.members_mut() = definition.members.clone();
    for (key, literal) in &definition.flags {
        region
            .apply_literal(registry, key, literal)
            .map_err(|source| RegionError::Flag {
                region: definition.id.clone(),
                source,
            })?;
    }
    Ok(())
}

struct Builder<'a> {
    definitions: &'a HashMap<String, &'a RegionDefinition>,
    registry: &'a FlagRegistry,
    built: BTreeMap<String, Arc<Region>>,
    visiting: HashSet<String>,
}

impl Builder<'_> {
    fn build(&mut self, id: &str) -> Result<Arc<Region>, RegionError> {
        if let Some(region) = self.built.get(id) {
            return Ok(Arc::clone(region));
        }
        let definitions = self.definitions;
        let Some(definition) = definitions.get(id).copied() else {
            return Err(RegionError::InvalidId(id.to_owned()));
        };
        if !self.visiting.insert(id.to_owned()) {
            return Err(RegionError::CircularInheritance {
                region: definition.id.clone(),
                parent: definition.parent.clone().unwrap_or_default(),
            });
        }

        if let Shape::Polygon { points, .. } = &definition.shape {
            if points.len() < 3 {
                return Err(RegionError::DegeneratePolygon {
                    region: definition.id.clone(),
                    points: points.len(),
                });
            }
        }

        let mut region =
            Region::new(&definition.id, definition.shape.clone())?.with_priority(definition.priority);

        if let Some(parent_id) = &definition.parent {
            let parent_key = parent_id.to_ascii_lowercase();
            if !definitions.contains_key(&parent_key) {
                return Err(RegionError::UnknownParent {
                    region: definition.id.clone(),
                    parent: parent_id.clone(),
                });
            }
            let parent = self.build(&parent_key)?;
            region.set_parent(Some(parent))?;
        }

        fill(&mut region, definition, self.registry)?;

        self.visiting.remove(id);
        let region = Arc::new(region);
        self.built.insert(id.to_owned(), Arc::clone(&region));
        Ok(region)
    }
}

// ---------------------------------------------------------------------------
// RegionIndex
// ---------------------------------------------------------------------------

/// A linear-scan [`RegionContainer`] over any number of worlds.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    worlds: HashMap<String, WorldRegions>,
}

impl RegionIndex {
    /// An index with no worlds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a world.
    pub fn insert_world(&mut self, world: &str, regions: WorldRegions) {
        self.worlds.insert(world.to_owned(), regions);
    }

    /// The regions of a world.
    pub fn world(&self, world: &str) -> Option<&WorldRegions> {
        self.worlds.get(world)
    }

    /// Mutable access to a world, creating it if needed.
    pub fn world_mut(&mut self, world: &str) -> &mut WorldRegions {
        self.worlds.entry(world.to_owned()).or_default()
    }

    /// Names of all indexed worlds.
    pub fn world_names(&self) -> impl Iterator<Item = &str> {
        self.worlds.keys().map(String::as_str)
    }
}

impl RegionContainer for RegionIndex {
    fn regions_containing(&self, world: &str, point: BlockPosition) -> Vec<Arc<Region>> {
        self.worlds.get(world).map_or_else(Vec::new, |w| {
            w.regions()
                .filter(|r| r.contains(point))
                .cloned()
                .collect()
        })
    }

    fn global_region(&self, world: &str) -> Option<Arc<Region>> {
        self.worlds.get(world).and_then(|w| w.global().cloned())
    }
}
