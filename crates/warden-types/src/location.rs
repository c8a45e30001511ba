//! Positions in the world.
//!
//! A [`Location`] is a continuous position inside a named world. Region
//! geometry works on block coordinates, so every location can be reduced
//! to its [`BlockPosition`].

use serde::{Deserialize, Serialize};

/// A point in continuous world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// East-west axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// North-south axis.
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Reduce this point to the block that contains it.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_block(self) -> BlockPosition {
        // `as` saturates on out-of-range floats, which is the wanted behavior
        // for coordinates beyond the world border.
        BlockPosition::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

/// Integer coordinates of a single block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BlockPosition {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis.
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl BlockPosition {
    /// Create a new block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl core::fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A position inside a named world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Name of the world the position belongs to.
    pub world: String,
    /// Coordinates within that world.
    pub position: Vec3,
}

impl Location {
    /// Create a location from a world name and coordinates.
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            position: Vec3::new(x, y, z),
        }
    }

    /// The block containing this location.
    pub fn block(&self) -> BlockPosition {
        self.position.to_block()
    }

    /// Whether both locations fall in the same block of the same world.
    ///
    /// Movement within a single block can never change the set of regions
    /// containing the actor.
    pub fn same_block(&self, other: &Self) -> bool {
        self.world == other.world && self.block() == other.block()
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}@({:.1}, {:.1}, {:.1})",
            self.world, self.position.x, self.position.y, self.position.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_floor_toward_negative_infinity() {
        let block = Vec3::new(-0.5, 64.9, -10.01).to_block();
        assert_eq!(block, BlockPosition::new(-1, 64, -11));
    }

    #[test]
    fn same_block_ignores_fractional_movement() {
        let a = Location::new("world", 10.1, 64.0, 5.2);
        let b = Location::new("world", 10.9, 64.5, 5.8);
        assert!(a.same_block(&b));
    }

    #[test]
    fn same_block_requires_same_world() {
        let a = Location::new("world", 10.0, 64.0, 5.0);
        let b = Location::new("nether", 10.0, 64.0, 5.0);
        assert!(!a.same_block(&b));
    }
}
