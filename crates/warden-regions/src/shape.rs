//! Region geometry.
//!
//! The resolution engine only ever asks a shape whether it contains a
//! block, so shapes are a closed enum rather than a trait. Containment is
//! inclusive on every face.

use serde::{Deserialize, Serialize};
use warden_types::BlockPosition;

/// The bounding geometry of a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// An axis-aligned box between two corners.
    Cuboid {
        /// Corner with the smallest coordinates.
        min: BlockPosition,
        /// Corner with the largest coordinates.
        max: BlockPosition,
    },
    /// A vertical prism over a polygon in the x/z plane.
    Polygon {
        /// Polygon vertices as `[x, z]` pairs, in order.
        points: Vec<[i32; 2]>,
        /// Lowest contained y.
        min_y: i32,
        /// Highest contained y.
        max_y: i32,
    },
    /// Every position in the world.
    Global,
}

impl Shape {
    /// A cuboid spanning two arbitrary corners.
    pub fn cuboid(a: BlockPosition, b: BlockPosition) -> Self {
        Self::Cuboid {
            min: BlockPosition::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPosition::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// A polygonal prism. The y bounds are swapped if given reversed.
    pub fn polygon(points: Vec<[i32; 2]>, min_y: i32, max_y: i32) -> Self {
        Self::Polygon {
            points,
            min_y: min_y.min(max_y),
            max_y: min_y.max(max_y),
        }
    }

    /// Whether the shape contains the block.
    pub fn contains(&self, point: BlockPosition) -> bool {
        match self {
            Self::Cuboid { min, max } => {
                (min.x..=max.x).contains(&point.x)
                    && (min.y..=max.y).contains(&point.y)
                    && (min.z..=max.z).contains(&point.z)
            }
            Self::Polygon {
                points,
                min_y,
                max_y,
            } => (*min_y..=*max_y).contains(&point.y) && polygon_contains(points, point.x, point.z),
            Self::Global => true,
        }
    }

    /// Whether this is the unbounded global shape.
    pub const fn is_global(&self) -> bool {
        matches!(self, Self::Global)
    }
}

/// Even-odd test in the x/z plane; points on an edge count as inside.
///
/// Products are computed in `i128` so coordinates anywhere in the `i32`
/// range cannot overflow.
#[allow(clippy::arithmetic_side_effects)]
fn polygon_contains(points: &[[i32; 2]], x: i32, z: i32) -> bool {
    let Some(&last) = points.last() else {
        return false;
    };
    if points.len() < 3 {
        return false;
    }

    let (px, pz) = (i128::from(x), i128::from(z));
    let mut inside = false;
    let mut prev = last;

    for &current in points {
        let (x1, z1) = (i128::from(prev[0]), i128::from(prev[1]));
        let (x2, z2) = (i128::from(current[0]), i128::from(current[1]));
        prev = current;

        let cross = (x2 - x1) * (pz - z1) - (z2 - z1) * (px - x1);
        let within_x = px >= x1.min(x2) && px <= x1.max(x2);
        let within_z = pz >= z1.min(z2) && pz <= z1.max(z2);
        if cross == 0 && within_x && within_z {
            return true;
        }

        if (z1 > pz) != (z2 > pz) {
            // The crossing x is x1 + (pz - z1) * (x2 - x1) / (z2 - z1); compare
            // without dividing by multiplying through by (z2 - z1).
            let lhs = (px - x1) * (z2 - z1);
            let rhs = (pz - z1) * (x2 - x1);
            let left_of_edge = if z2 > z1 { lhs < rhs } else { lhs > rhs };
            if left_of_edge {
                inside = !inside;
            }
        }
    }

    inside
}
