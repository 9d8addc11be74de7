use glam::{Mat2, Vec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned box (min/max corners).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds2D {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds2D {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y, "Bounds2D min must not exceed max");
        Self { min, max }
    }

    /// Tight bounds of a vertex ring. An empty ring yields a zero box at the origin.
    pub fn from_points(points: &[Vec2]) -> Self {
        let Some((&first, rest)) = points.split_first() else {
            return Self::default();
        };
        let (min, max) = rest
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Self { min, max }
    }

    pub fn from_circle(center: Vec2, radius: f32) -> Self {
        let r = Vec2::splat(radius);
        Self { min: center - r, max: center + r }
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.extents()
    }

    /// Half size.
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// True when the box is wider or taller than one grid cell.
    pub fn exceeds(&self, cell_size: f32) -> bool {
        let s = self.size();
        s.x > cell_size || s.y > cell_size
    }

    /// Strict overlap on all four half-planes; touching edges do not count.
    pub fn overlaps(&self, other: &Bounds2D) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.max.y > other.min.y
            && self.min.y < other.max.y
    }
}

/// Scalar interval of a shape projected onto an axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    pub min: f32,
    pub max: f32,
}

impl Projection {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn of_points(axis: Vec2, points: &[Vec2]) -> Self {
        let (min, max) = points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
            let d = p.dot(axis);
            (lo.min(d), hi.max(d))
        });
        Self { min, max }
    }

    pub fn of_circle(axis: Vec2, center: Vec2, radius: f32) -> Self {
        let d = center.dot(axis);
        Self { min: d - radius, max: d + radius }
    }

    /// Closed-interval overlap: `!(a.min > b.max || b.min > a.max)`.
    pub fn overlaps(&self, other: &Projection) -> bool {
        !(self.min > other.max || other.min > self.max)
    }

    /// Open-interval containment of a scalar.
    pub fn contains(&self, v: f32) -> bool {
        v > self.min && v < self.max
    }
}

/// Minimum translation vector kept as a running minimum across tested axes.
///
/// `direction` pushes the source shape away from the target shape.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Mtv {
    pub direction: Vec2,
    pub magnitude: f32,
}

impl Mtv {
    /// Starting value before any axis has been tested.
    pub const MAX: Mtv = Mtv { direction: Vec2::ZERO, magnitude: f32::MAX };

    /// Fold one overlapping axis into the running minimum.
    ///
    /// Ties go to the later axis.
    pub fn update(
        &mut self,
        axis: Vec2,
        source: Projection,
        target: Projection,
        source_center: Vec2,
        target_center: Vec2,
    ) {
        let o0 = source.max - target.min;
        let o1 = target.max - source.min;
        let m = o0.abs().min(o1.abs());
        if m <= self.magnitude.abs() {
            let toward_target = (target_center - source_center).dot(axis);
            let sign = if toward_target > 0.0 { -1.0 } else { 1.0 };
            self.magnitude = m;
            self.direction = axis * sign;
        }
    }

    /// Same overlap seen from the other shape.
    pub fn flipped(self) -> Self {
        Self { direction: -self.direction, magnitude: self.magnitude }
    }
}

/// Vertex of `ring` nearest to `p`; `p` itself for an empty ring.
pub fn closest_vertex(p: Vec2, ring: &[Vec2]) -> Vec2 {
    ring.iter()
        .copied()
        .min_by(|a, b| a.distance_squared(p).total_cmp(&b.distance_squared(p)))
        .unwrap_or(p)
}

/// Twice the signed area; positive for counter-clockwise rings.
pub fn signed_area2(ring: &[Vec2]) -> f32 {
    let n = ring.len();
    (0..n).map(|i| ring[i].perp_dot(ring[(i + 1) % n])).sum()
}

/// Outward unit normal for every edge `ring[i] -> ring[i + 1]`, either winding.
pub fn edge_normals(ring: &[Vec2]) -> Vec<Vec2> {
    let n = ring.len();
    let outward = if signed_area2(ring) >= 0.0 { 1.0 } else { -1.0 };
    (0..n)
        .map(|i| {
            let edge = ring[(i + 1) % n] - ring[i];
            // Clockwise perpendicular of a CCW edge points out.
            Vec2::new(edge.y, -edge.x).normalize_or_zero() * outward
        })
        .collect()
}

/// Rotate local vertex offsets by `degrees` around the pivot, then translate to it.
pub fn transform_ring(offsets: &[Vec2], pivot: Vec2, degrees: f32) -> Vec<Vec2> {
    let rotation = Mat2::from_angle(degrees.to_radians());
    offsets.iter().map(|&o| rotation * o + pivot).collect()
}
