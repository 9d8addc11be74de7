use glam::Vec2;

use crate::geometry::Mtv;
use crate::narrowphase::PolygonRef;
use crate::types::*;

/// Public API contract for the per-step collision world.
pub trait CollisionWorldApi {
    /// Construct a new world with the given configuration.
    fn new(cfg: WorldConfig) -> Self
    where
        Self: Sized;

    // --- Step lifecycle ----------------------------------------------------

    /// Begin a new step. Clears shapes and contact buffers and rotates the pair history.
    fn begin_step(&mut self);

    /// Insert a shape for this step and return its step-local handle.
    fn push(&mut self, shape: ShapeSnapshot) -> FrameId;

    /// Convenience: push a circle collider.
    fn push_circle(
        &mut self,
        collider: ColliderId,
        owner: EntityId,
        center: Vec2,
        radius: f32,
        tags: TagMask,
    ) -> FrameId;

    /// Convenience: push a convex polygon from a world-space vertex ring.
    fn push_polygon(
        &mut self,
        collider: ColliderId,
        owner: EntityId,
        vertices: Vec<Vec2>,
        tags: TagMask,
    ) -> FrameId;

    /// Choose how an entity reacts to its contacts. Persists across steps.
    fn set_resolution_mode(&mut self, entity: EntityId, mode: ResolutionMode);

    /// Partition, broad phase and narrow phase; fills the contact buffers.
    fn detect(&mut self);

    /// This step's contacts for an entity (empty if none).
    fn contacts(&self, entity: EntityId) -> &[ContactRecord];

    /// Corrections for entities in `MoveOut` or `ForceOut` mode.
    fn resolve(&mut self) -> Vec<(EntityId, Correction)>;

    /// `detect` followed by `resolve`.
    fn step(&mut self) -> Vec<(EntityId, Correction)> {
        self.detect();
        self.resolve()
    }

    // --- Pairwise checks ---------------------------------------------------

    /// SAT test between two colliders pushed this step, oriented for `a`.
    fn overlap_by_collider(&self, a: ColliderId, b: ColliderId) -> Option<Mtv>;
}

/// Separating-axis primitives. Every MTV pushes the first shape away from the second.
pub trait NarrowphaseApi {
    fn circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> Option<Mtv>;
    fn circle_polygon(center: Vec2, radius: f32, polygon: PolygonRef<'_>) -> Option<Mtv>;
    fn polygon_polygon(source: PolygonRef<'_>, target: PolygonRef<'_>) -> Option<Mtv>;
}
