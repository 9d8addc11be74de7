use glam::Vec2;
use rayon::prelude::*;

use crate::api::NarrowphaseApi;
use crate::broadphase::CandidatePair;
use crate::geometry::{Mtv, Projection, closest_vertex};
use crate::history::ContactHistory;
use crate::types::*;

/// Borrowed view of a convex polygon.
#[derive(Copy, Clone, Debug)]
pub struct PolygonRef<'a> {
    pub vertices: &'a [Vec2],
    pub normals: &'a [Vec2],
    pub center: Vec2,
}

/// Separating-axis tests with minimum translation vectors.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn circle_circle(c0: Vec2, r0: f32, c1: Vec2, r1: f32) -> Option<Mtv> {
        // Coincident centers have no defined axis; +X keeps the normal unit length.
        let axis = (c0 - c1).try_normalize().unwrap_or(Vec2::X);
        let p0 = Projection::of_circle(axis, c0, r0);
        let p1 = Projection::of_circle(axis, c1, r1);
        if !p0.overlaps(&p1) {
            return None;
        }
        let mut mtv = Mtv::MAX;
        mtv.update(axis, p0, p1, c0, c1);
        Some(mtv)
    }

    fn circle_polygon(center: Vec2, radius: f32, polygon: PolygonRef<'_>) -> Option<Mtv> {
        let mut mtv = Mtv::MAX;
        let mut check_corner = true;
        for &n in polygon.normals {
            // Zero-length edges have no axis.
            if n == Vec2::ZERO {
                continue;
            }
            let p0 = Projection::of_circle(n, center, radius);
            let p1 = Projection::of_points(n, polygon.vertices);
            check_corner = check_corner && !p1.contains(center.dot(n));
            if !p0.overlaps(&p1) {
                return None;
            }
            mtv.update(n, p0, p1, center, polygon.center);
        }

        if check_corner {
            let corner = closest_vertex(center, polygon.vertices);
            if let Some(n) = (corner - center).try_normalize() {
                let p0 = Projection::of_circle(n, center, radius);
                let p1 = Projection::of_points(n, polygon.vertices);
                if !p0.overlaps(&p1) {
                    return None;
                }
                mtv.update(n, p0, p1, center, polygon.center);
            }
        }
        // No usable axis at all: a fully collapsed ring.
        (mtv.direction != Vec2::ZERO).then_some(mtv)
    }

    fn polygon_polygon(source: PolygonRef<'_>, target: PolygonRef<'_>) -> Option<Mtv> {
        let mut mtv = Mtv::MAX;
        for &n in source.normals.iter().chain(target.normals) {
            if n == Vec2::ZERO {
                continue;
            }
            let p0 = Projection::of_points(n, source.vertices);
            let p1 = Projection::of_points(n, target.vertices);
            if !p0.overlaps(&p1) {
                return None;
            }
            mtv.update(n, p0, p1, source.center, target.center);
        }
        (mtv.direction != Vec2::ZERO).then_some(mtv)
    }
}

fn polygon_at(shape: &ShapeSnapshot, center: Vec2) -> Option<PolygonRef<'_>> {
    shape
        .ring()
        .map(|(vertices, normals)| PolygonRef { vertices, normals, center })
}

/// Pick the SAT test by shape-kind combination. The MTV is oriented for `source`.
///
/// Returns `None` as well when a kind does not match the shape's geometry.
pub fn test_kinds(
    source: &ShapeSnapshot,
    target: &ShapeSnapshot,
    kinds: (ShapeKind, ShapeKind),
    source_center: Vec2,
    target_center: Vec2,
) -> Option<Mtv> {
    match kinds {
        (ShapeKind::Circle, ShapeKind::Circle) => Narrowphase::circle_circle(
            source_center,
            source.radius()?,
            target_center,
            target.radius()?,
        ),
        (ShapeKind::Circle, ShapeKind::Polygon) => Narrowphase::circle_polygon(
            source_center,
            source.radius()?,
            polygon_at(target, target_center)?,
        ),
        // Same overlap seen from the polygon.
        (ShapeKind::Polygon, ShapeKind::Circle) => Narrowphase::circle_polygon(
            target_center,
            target.radius()?,
            polygon_at(source, source_center)?,
        )
        .map(Mtv::flipped),
        (ShapeKind::Polygon, ShapeKind::Polygon) => Narrowphase::polygon_polygon(
            polygon_at(source, source_center)?,
            polygon_at(target, target_center)?,
        ),
    }
}

/// `test_kinds` with the kinds and centers read off the shapes.
pub fn test_pair(source: &ShapeSnapshot, target: &ShapeSnapshot) -> Option<Mtv> {
    test_kinds(source, target, (source.kind(), target.kind()), source.center(), target.center())
}

/// `test_kinds` with the kinds and centers the broad phase captured.
pub fn test_candidate(shapes: &[ShapeSnapshot], c: &CandidatePair) -> Option<Mtv> {
    test_kinds(
        &shapes[c.source],
        &shapes[c.target],
        (c.source_kind, c.target_kind),
        c.source_center,
        c.target_center,
    )
}

/// Contacts produced for one source entity in one step.
#[derive(Clone, Debug, Default)]
pub struct EntityContacts {
    pub owner: EntityId,
    pub contacts: Vec<ContactRecord>,
    /// Pair ids to record as colliding this step.
    pub pairs: Vec<PairId>,
}

fn test_group(
    shapes: &[ShapeSnapshot],
    group: &[CandidatePair],
    history: &ContactHistory,
) -> EntityContacts {
    let owner = shapes[group[0].source].owner;
    let mut out = EntityContacts { owner, ..Default::default() };
    for c in group {
        let Some(mtv) = test_candidate(shapes, c) else {
            continue;
        };
        let source = &shapes[c.source];
        let target = &shapes[c.target];
        let id = PairId::new(source.collider, target.collider);
        out.contacts.push(ContactRecord {
            other: target.owner,
            collider: source.collider,
            other_collider: target.collider,
            point: (c.source_center + c.target_center) * 0.5,
            normal: mtv.direction,
            depth: mtv.magnitude,
            is_new: !history.was_colliding(id),
        });
        out.pairs.push(id);
    }
    out
}

/// Run SAT on every candidate, grouped by source entity.
///
/// Candidates are sorted so that each entity's pairs are contiguous; every
/// group is handled by exactly one worker, which is the only writer of that
/// entity's contacts. History is read-only here; the caller records `pairs`
/// once the stage completes.
pub fn run(
    shapes: &[ShapeSnapshot],
    candidates: &mut [CandidatePair],
    history: &ContactHistory,
    parallel: bool,
) -> Vec<EntityContacts> {
    candidates.sort_unstable_by_key(|c| (shapes[c.source].owner, c.source, c.target));
    let groups: Vec<&[CandidatePair]> = candidates
        .chunk_by(|a, b| shapes[a.source].owner == shapes[b.source].owner)
        .collect();

    let mut out: Vec<EntityContacts> = if parallel {
        groups
            .par_iter()
            .map(|g| test_group(shapes, g, history))
            .collect()
    } else {
        groups.iter().map(|g| test_group(shapes, g, history)).collect()
    };
    out.retain(|e| !e.contacts.is_empty());
    out
}
