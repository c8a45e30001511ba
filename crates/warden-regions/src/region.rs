//! The region data model.
//!
//! A [`Region`] is a named, prioritized area with owner and member domains
//! and a sparse map of flag values. Regions form a forest through their
//! optional parent; because a parent is held as an `Arc<Region>` built
//! before the child, a finished region can never be its own ancestor.
//! [`Region::set_parent`] still rejects a parent chain that already
//! contains the child's id so rebuilt copies cannot loop by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use warden_types::{ActorId, Flag, FlagError, FlagLiteral, FlagRegistry, FlagValue, RegionGroup};

use crate::domain::Domain;
use crate::error::RegionError;
use crate::shape::Shape;

/// Identifier of the per-world global region.
pub const GLOBAL_REGION_ID: &str = "__global__";

/// A named, prioritized, optionally nested area carrying flag overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    id: String,
    display_id: String,
    priority: i32,
    parent: Option<Arc<Self>>,
    owners: Domain,
    members: Domain,
    flags: BTreeMap<String, FlagValue>,
    shape: Shape,
}

impl Region {
    /// Create a region with priority 0 and no parent, owners or flags.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidId`] if the id is empty or contains
    /// characters other than letters, digits and `_ , ' - + /`.
    pub fn new(id: &str, shape: Shape) -> Result<Self, RegionError> {
        if !Self::is_valid_id(id) {
            return Err(RegionError::InvalidId(id.to_owned()));
        }
        Ok(Self {
            id: id.to_ascii_lowercase(),
            display_id: id.to_owned(),
            priority: 0,
            parent: None,
            owners: Domain::new(),
            members: Domain::new(),
            flags: BTreeMap::new(),
            shape,
        })
    }

    /// The per-world global region: contains everything, consulted only
    /// when no placed region yields a value.
    pub fn global() -> Self {
        Self {
            id: GLOBAL_REGION_ID.to_owned(),
            display_id: GLOBAL_REGION_ID.to_owned(),
            priority: 0,
            parent: None,
            owners: Domain::new(),
            members: Domain::new(),
            flags: BTreeMap::new(),
            shape: Shape::Global,
        }
    }

    /// Whether `id` is an acceptable region identifier.
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '\'' | '-' | '+' | '/'))
    }

    // -----------------------------------------------------------------------
    // Identity and ordering
    // -----------------------------------------------------------------------

    /// The lowercase identifier used for comparisons.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identifier as originally written.
    pub fn display_id(&self) -> &str {
        &self.display_id
    }

    /// Priority; higher wins.
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Change the priority.
    pub const fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Builder form of [`Region::set_priority`].
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether this is the global region.
    pub fn is_global(&self) -> bool {
        self.id == GLOBAL_REGION_ID
    }

    // -----------------------------------------------------------------------
    // Inheritance
    // -----------------------------------------------------------------------

    /// The parent region, if any.
    pub const fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// Set or clear the parent.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::CircularInheritance`] if the region appears in
    /// the new parent's chain, and [`RegionError::GlobalWithParent`] when
    /// called on the global region.
    pub fn set_parent(&mut self, parent: Option<Arc<Self>>) -> Result<(), RegionError> {
        let Some(parent) = parent else {
            self.parent = None;
            return Ok(());
        };
        if self.is_global() {
            return Err(RegionError::GlobalWithParent(self.id.clone()));
        }
        let mut current = Some(parent.as_ref());
        while let Some(region) = current {
            if region.id == self.id {
                return Err(RegionError::CircularInheritance {
                    region: self.id.clone(),
                    parent: parent.id.clone(),
                });
            }
            current = region.parent.as_deref();
        }
        self.parent = Some(parent);
        Ok(())
    }

    /// The region itself followed by its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |r| r.parent.as_deref())
    }

    /// The ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Self> {
        self.lineage().skip(1)
    }

    // -----------------------------------------------------------------------
    // Domains
    // -----------------------------------------------------------------------

    /// The owners domain.
    pub const fn owners(&self) -> &Domain {
        &self.owners
    }

    /// Mutable access to the owners domain.
    pub const fn owners_mut(&mut self) -> &mut Domain {
        &mut self.owners
    }

    /// The members domain.
    pub const fn members(&self) -> &Domain {
        &self.members
    }

    /// Mutable access to the members domain.
    pub const fn members_mut(&mut self) -> &mut Domain {
        &mut self.members
    }

    /// Whether the actor owns this region or any ancestor.
    pub fn is_owner(&self, actor: ActorId, groups: &[String]) -> bool {
        self.lineage().any(|r| r.owners.contains(actor, groups))
    }

    /// Whether the actor is a member (or owner) of this region or any
    /// ancestor.
    pub fn is_member(&self, actor: ActorId, groups: &[String]) -> bool {
        self.is_owner(actor, groups) || self.is_member_only(actor, groups)
    }

    /// Whether the actor is listed as a member of this region or any
    /// ancestor, ignoring ownership.
    pub fn is_member_only(&self, actor: ActorId, groups: &[String]) -> bool {
        self.lineage().any(|r| r.members.contains(actor, groups))
    }

    // -----------------------------------------------------------------------
    // Flags
    // -----------------------------------------------------------------------

    /// The raw value stored under `key` on this region only.
    pub fn flag(&self, key: &str) -> Option<&FlagValue> {
        self.flags.get(&key.to_ascii_lowercase())
    }

    /// The value of `flag` set on this region only (no inheritance).
    pub fn flag_value(&self, flag: &Flag) -> Option<&FlagValue> {
        self.flags.get(flag.name())
    }

    /// The companion group set on this region only, if any.
    pub fn group_for(&self, flag: &Flag) -> Option<RegionGroup> {
        self.flags
            .get(&flag.group_flag_name())
            .and_then(FlagValue::as_group)
    }

    /// Set a flag value.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::TypeMismatch`] if the value does not belong to
    /// the flag's kind.
    pub fn set_flag(&mut self, flag: &Flag, value: FlagValue) -> Result<(), FlagError> {
        if !value.matches_kind(flag.kind()) {
            return Err(FlagError::TypeMismatch {
                flag: flag.name().to_owned(),
                expected: flag.kind(),
                found: value.to_string(),
            });
        }
        self.flags.insert(flag.name().to_owned(), value);
        Ok(())
    }

    /// Remove a flag value (the companion group is kept).
    pub fn clear_flag(&mut self, flag: &Flag) -> Option<FlagValue> {
        self.flags.remove(flag.name())
    }

    /// Restrict this region's value of `flag` to a membership class.
    pub fn set_group(&mut self, flag: &Flag, group: RegionGroup) {
        self.flags
            .insert(flag.group_flag_name(), FlagValue::Group(group));
    }

    /// Remove the companion group, falling back to the flag's default group.
    pub fn clear_group(&mut self, flag: &Flag) -> Option<RegionGroup> {
        self.flags
            .remove(&flag.group_flag_name())
            .and_then(|v| v.as_group())
    }

    /// Apply a configuration entry, which may name a flag or a companion
    /// group flag.
    ///
    /// # Errors
    ///
    /// Returns [`FlagError::UnknownFlag`] if `key` is not registered, or the
    /// parse error for a literal of the wrong kind.
    pub fn apply_literal(
        &mut self,
        registry: &FlagRegistry,
        key: &str,
        literal: &FlagLiteral,
    ) -> Result<(), FlagError> {
        if let Some(flag) = registry.get(key) {
            let value = flag.parse_literal(literal)?;
            self.flags.insert(flag.name().to_owned(), value);
            return Ok(());
        }
        if let Some(flag) = registry.resolve_group_key(key) {
            let value = flag.parse_group_literal(literal)?;
            self.flags.insert(flag.group_flag_name(), value);
            return Ok(());
        }
        Err(FlagError::UnknownFlag(key.to_owned()))
    }

    /// Every stored entry, group flags included, in key order.
    pub fn flags(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.flags.iter().map(|(k, v)| (k.as_str(), v))
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// The bounding shape.
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether the region contains the block.
    pub fn contains(&self, point: warden_types::BlockPosition) -> bool {
        self.shape.contains(point)
    }
}

impl core::fmt::Display for Region {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (priority {})", self.display_id, self.priority)
    }
}
