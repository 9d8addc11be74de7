use std::f32::consts::TAU;

use glam::{Mat2, Vec2};
use gridsat::narrowphase::{Narrowphase, PolygonRef};
use gridsat::*;
use proptest::prelude::*;

fn coord() -> impl Strategy<Value = f32> {
    -5.0f32..5.0
}

/// Convex polygon: an affinely squashed, rotated regular n-gon.
#[derive(Clone, Debug)]
struct Convex {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    center: Vec2,
}

impl Convex {
    fn view(&self) -> PolygonRef<'_> {
        PolygonRef { vertices: &self.vertices, normals: &self.normals, center: self.center }
    }

    fn contains(&self, p: Vec2) -> bool {
        self.vertices
            .iter()
            .zip(&self.normals)
            .all(|(&v, &n)| (p - v).dot(n) < 0.0)
    }
}

fn convex() -> impl Strategy<Value = Convex> {
    (
        (-2.0f32..2.0, -2.0f32..2.0),
        0.3f32..1.5,
        (0.5f32..1.5, 0.5f32..1.5),
        3usize..8,
        0.0f32..TAU,
    )
        .prop_map(|((cx, cy), r, (sx, sy), n, rot)| {
            let turn = Mat2::from_angle(rot);
            let vertices: Vec<Vec2> = (0..n)
                .map(|k| {
                    let a = TAU * k as f32 / n as f32;
                    Vec2::new(cx, cy) + turn * Vec2::new(sx * r * a.cos(), sy * r * a.sin())
                })
                .collect();
            let shape = ShapeSnapshot::polygon(0, 0, vertices, TagMask::default());
            let center = shape.center();
            match shape.geometry {
                ShapeGeometry::Polygon { vertices, normals } => Convex { vertices, normals, center },
                ShapeGeometry::Circle { .. } => unreachable!(),
            }
        })
}

/// Dense sampling of the bounds intersection for a point strictly inside both.
fn sampled(ba: Bounds2D, bb: Bounds2D, inside_both: impl Fn(Vec2) -> bool) -> bool {
    let lo = ba.min.max(bb.min);
    let hi = ba.max.min(bb.max);
    if lo.x >= hi.x || lo.y >= hi.y {
        return false;
    }
    const N: usize = 100;
    let step = (hi - lo) / N as f32;
    (0..=N).any(|i| {
        (0..=N).any(|j| inside_both(lo + Vec2::new(step.x * i as f32, step.y * j as f32)))
    })
}

fn sampled_overlap(a: &Convex, b: &Convex) -> bool {
    sampled(
        Bounds2D::from_points(&a.vertices),
        Bounds2D::from_points(&b.vertices),
        |p| a.contains(p) && b.contains(p),
    )
}

fn sampled_circle_overlap(center: Vec2, radius: f32, poly: &Convex) -> bool {
    sampled(
        Bounds2D::from_circle(center, radius),
        Bounds2D::from_points(&poly.vertices),
        |p| p.distance_squared(center) < radius * radius && poly.contains(p),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn circle_pairs_match_distance_rule(
        x0 in coord(), y0 in coord(), x1 in coord(), y1 in coord(),
        r0 in 0.1f32..3.0, r1 in 0.1f32..3.0,
    ) {
        let c0 = Vec2::new(x0, y0);
        let c1 = Vec2::new(x1, y1);
        let dist = c0.distance(c1);
        let rsum = r0 + r1;
        prop_assume!((dist - rsum).abs() > 1e-3);

        let hit = Narrowphase::circle_circle(c0, r0, c1, r1);
        prop_assert_eq!(hit.is_some(), dist < rsum);
        if let Some(mtv) = hit {
            prop_assert!((mtv.magnitude - (rsum - dist)).abs() < 1e-3);
            prop_assert!((mtv.direction.length() - 1.0).abs() < 1e-4);
            if dist > 1e-3 {
                let away = (c0 - c1) / dist;
                prop_assert!((mtv.direction - away).length() < 1e-3);
            }
        }
    }

    #[test]
    fn polygon_sat_agrees_with_sampling(a in convex(), b in convex()) {
        let hit = Narrowphase::polygon_polygon(a.view(), b.view());
        let reverse = Narrowphase::polygon_polygon(b.view(), a.view());
        prop_assert_eq!(hit.is_some(), reverse.is_some());

        match hit {
            // A separating axis exists, so no point can be inside both.
            None => prop_assert!(!sampled_overlap(&a, &b)),
            // Skip grazing contacts the sampling grid cannot resolve.
            Some(mtv) if mtv.magnitude >= 0.1 => prop_assert!(sampled_overlap(&a, &b)),
            Some(mtv) => prop_assert!(mtv.magnitude >= 0.0),
        }
    }

    #[test]
    fn separated_circle_and_polygon_share_no_point(
        x in -4.0f32..4.0, y in -4.0f32..4.0, r in 0.1f32..2.0, poly in convex(),
    ) {
        let center = Vec2::new(x, y);
        let hit = Narrowphase::circle_polygon(center, r, poly.view());
        if hit.is_none() {
            prop_assert!(!sampled_circle_overlap(center, r, &poly));
        }
    }

    #[test]
    fn polygon_depth_is_order_independent(a in convex(), b in convex()) {
        let ab = Narrowphase::polygon_polygon(a.view(), b.view());
        let ba = Narrowphase::polygon_polygon(b.view(), a.view());
        if let (Some(ab), Some(ba)) = (ab, ba) {
            prop_assert!((ab.magnitude - ba.magnitude).abs() < 1e-5);
            prop_assert!((ab.direction.length() - 1.0).abs() < 1e-4);
        }
    }
}
