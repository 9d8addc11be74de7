use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ShapeError};
use crate::geometry::{Bounds2D, edge_normals};

/// Identifier of one collider. Unique within a step.
pub type ColliderId = u32;

/// Identifier of the entity owning one or more colliders (e.g., pack your entity index).
pub type EntityId = u32;

/// Step-local handle for shapes pushed this step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u32);

/// Canonical id of an unordered collider pair: low id in the low 32 bits, high id above.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairId(pub u64);

impl PairId {
    pub fn new(a: ColliderId, b: ColliderId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(u64::from(lo) | (u64::from(hi) << 32))
    }

    pub fn low(self) -> ColliderId {
        self.0 as u32
    }

    pub fn high(self) -> ColliderId {
        (self.0 >> 32) as u32
    }
}

/// Asymmetric tag filtering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMask {
    /// Categories this collider belongs to; other colliders test their targets against it.
    pub self_tags: u32,
    /// Categories this collider generates contacts toward.
    pub target_tags: u32,
}

impl TagMask {
    pub fn new(self_tags: u32, target_tags: u32) -> Self {
        Self { self_tags, target_tags }
    }

    /// A source may hit a target iff `(source.target_tags & target.self_tags) != 0`.
    /// Not symmetric: the target is not required to accept the source.
    pub fn can_collide(self, target: TagMask) -> bool {
        (self.target_tags & target.self_tags) != 0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Polygon,
}

/// World-space geometry resolved by the upstream transform stage.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeGeometry {
    Circle { center: Vec2, radius: f32 },
    /// Convex ring with one outward unit normal per edge (`vertices[i] -> vertices[i + 1]`).
    Polygon { vertices: Vec<Vec2>, normals: Vec<Vec2> },
}

/// One collidable shape for **this step**.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeSnapshot {
    pub collider: ColliderId,
    pub owner: EntityId,
    pub tags: TagMask,
    pub bounds: Bounds2D,
    pub geometry: ShapeGeometry,
}

impl ShapeSnapshot {
    pub fn circle(
        collider: ColliderId,
        owner: EntityId,
        center: Vec2,
        radius: f32,
        tags: TagMask,
    ) -> Self {
        Self {
            collider,
            owner,
            tags,
            bounds: Bounds2D::from_circle(center, radius),
            geometry: ShapeGeometry::Circle { center, radius },
        }
    }

    /// Convex polygon from a world-space ring; bounds and edge normals are derived.
    pub fn polygon(collider: ColliderId, owner: EntityId, vertices: Vec<Vec2>, tags: TagMask) -> Self {
        let normals = edge_normals(&vertices);
        Self {
            collider,
            owner,
            tags,
            bounds: Bounds2D::from_points(&vertices),
            geometry: ShapeGeometry::Polygon { vertices, normals },
        }
    }

    /// Axis-aligned box expressed as a four-vertex polygon.
    pub fn rect(
        collider: ColliderId,
        owner: EntityId,
        center: Vec2,
        half_extents: Vec2,
        tags: TagMask,
    ) -> Self {
        let h = half_extents;
        let ring = vec![
            center + Vec2::new(-h.x, -h.y),
            center + Vec2::new(h.x, -h.y),
            center + Vec2::new(h.x, h.y),
            center + Vec2::new(-h.x, h.y),
        ];
        Self::polygon(collider, owner, ring, tags)
    }

    pub fn kind(&self) -> ShapeKind {
        match self.geometry {
            ShapeGeometry::Circle { .. } => ShapeKind::Circle,
            ShapeGeometry::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    pub fn radius(&self) -> Option<f32> {
        match self.geometry {
            ShapeGeometry::Circle { radius, .. } => Some(radius),
            ShapeGeometry::Polygon { .. } => None,
        }
    }

    /// Vertices and edge normals of a polygon.
    pub fn ring(&self) -> Option<(&[Vec2], &[Vec2])> {
        match &self.geometry {
            ShapeGeometry::Polygon { vertices, normals } => Some((vertices.as_slice(), normals.as_slice())),
            ShapeGeometry::Circle { .. } => None,
        }
    }

    /// Bounds center; equals the circle center for circles.
    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    /// Check the producer-side preconditions. The pipeline itself only asserts
    /// this in debug builds.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let collider = self.collider;
        if !(self.bounds.min.is_finite() && self.bounds.max.is_finite()) {
            return Err(ShapeError::NonFinite { collider });
        }
        match &self.geometry {
            ShapeGeometry::Circle { center, radius } => {
                if !center.is_finite() || !radius.is_finite() {
                    return Err(ShapeError::NonFinite { collider });
                }
                if *radius < 0.0 {
                    return Err(ShapeError::NegativeRadius { collider, radius: *radius });
                }
            }
            ShapeGeometry::Polygon { vertices, normals } => {
                if vertices.len() < 3 {
                    return Err(ShapeError::TooFewVertices { collider, count: vertices.len() });
                }
                if normals.len() != vertices.len() {
                    return Err(ShapeError::NormalCountMismatch {
                        collider,
                        vertices: vertices.len(),
                        normals: normals.len(),
                    });
                }
                if vertices.iter().chain(normals).any(|v| !v.is_finite()) {
                    return Err(ShapeError::NonFinite { collider });
                }
            }
        }
        Ok(())
    }
}

/// One confirmed overlap, stored in the source entity's contact buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactRecord {
    /// Entity owning the other collider.
    pub other: EntityId,
    /// Collider of the buffer owner that produced this contact.
    pub collider: ColliderId,
    pub other_collider: ColliderId,
    /// Midpoint between the two shape centers.
    pub point: Vec2,
    /// Unit separating direction; moves the buffer owner away from `other`.
    pub normal: Vec2,
    /// Penetration depth (≥ 0).
    pub depth: f32,
    /// True if the pair was not colliding in the previous step.
    pub is_new: bool,
}

impl ContactRecord {
    /// `normal * depth`.
    pub fn separation(&self) -> Vec2 {
        self.normal * self.depth
    }
}

/// How an entity reacts to its contacts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionMode {
    /// Contacts are recorded but never resolved (triggers, sensors).
    #[default]
    None,
    /// Displace the position by the summed separation.
    MoveOut,
    /// Turn the summed separation into a force for the integrator.
    ForceOut,
}

/// Output of the resolution pass for one entity.
///
/// Both variants already point away from the overlapped shapes, because every
/// contact normal does. Add them as they are: `position += d`, `force += f`.
/// Do not negate a `Force` before applying it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Correction {
    /// Summed `normal * depth`, added to the position.
    Displace(Vec2),
    /// Summed `normal * depth` as a repulsive force. Equal to subtracting the
    /// total penetration (which points into the other shapes) from the force.
    Force(Vec2),
}

/// World-level configuration for the collision pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid cell size in world units. Shapes larger than one cell go to the oversized list.
    pub cell_size: f32,
    /// Run the stages on the rayon pool.
    pub parallel: bool,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { cell_size: 100.0, parallel: true, enable_timing: false }
    }
}

impl WorldConfig {
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self { cell_size, ..Default::default() }
    }

    /// Single-threaded config; handy when stepping through a frame in a debugger.
    pub fn sequential() -> Self {
        Self { parallel: false, ..Default::default() }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_size.is_finite() && self.cell_size > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidCellSize(self.cell_size))
        }
    }
}

/// Debug statistics for the last detected step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepStats {
    pub shapes: usize,
    /// Distinct cell keys in the target index.
    pub cells: usize,
    pub source_entries: usize,
    pub target_entries: usize,
    pub oversized: usize,
    pub candidates: usize,
    pub contacts: usize,
    pub new_contacts: usize,
}

/// Timing breakdown for the last completed step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTiming {
    pub detect_ms: f64,
    pub partition_ms: f64,
    pub broadphase_ms: f64,
    pub narrowphase_ms: f64,
    pub resolve_ms: f64,
}
