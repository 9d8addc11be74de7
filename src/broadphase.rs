//! Candidate pair generation from the partitioned grid.

use glam::Vec2;
use rayon::prelude::*;

use crate::partition::{CellKey, Partition};
use crate::types::{ShapeKind, ShapeSnapshot};

/// A broad-phase hit, consumed by the narrow phase in the same step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CandidatePair {
    /// Index of the source shape in the step's shape list.
    pub source: usize,
    pub target: usize,
    pub source_kind: ShapeKind,
    pub target_kind: ShapeKind,
    pub source_center: Vec2,
    pub target_center: Vec2,
}

/// Identity, tag and AABB filter applied to every (source, target) sharing a cell.
pub fn is_candidate(source: &ShapeSnapshot, target: &ShapeSnapshot) -> bool {
    source.collider != target.collider
        && source.tags.can_collide(target.tags)
        && source.bounds.overlaps(&target.bounds)
}

fn scan_cell(
    shapes: &[ShapeSnapshot],
    partition: &Partition,
    key: CellKey,
    sources: &[usize],
) -> Vec<CandidatePair> {
    let Some(targets) = partition.target().get(&key) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for &si in sources {
        let s = &shapes[si];
        for &ti in targets {
            let t = &shapes[ti];
            if !is_candidate(s, t) {
                continue;
            }
            out.push(CandidatePair {
                source: si,
                target: ti,
                source_kind: s.kind(),
                target_kind: t.kind(),
                source_center: s.center(),
                target_center: t.center(),
            });
        }
    }
    out
}

/// Scan every source cell against the target index.
///
/// Source cells are split across workers; each worker owns whole cells, so no
/// two workers ever read or emit for the same cell. Output order follows the
/// sorted cell keys.
pub fn find_candidates(
    shapes: &[ShapeSnapshot],
    partition: &Partition,
    parallel: bool,
) -> Vec<CandidatePair> {
    let mut cells: Vec<(CellKey, &[usize])> = partition
        .source()
        .iter()
        .map(|(&k, v)| (k, v.as_slice()))
        .collect();
    cells.sort_unstable_by_key(|&(k, _)| k);

    if parallel {
        cells
            .par_iter()
            .flat_map_iter(|&(key, sources)| scan_cell(shapes, partition, key, sources))
            .collect()
    } else {
        cells
            .iter()
            .flat_map(|&(key, sources)| scan_cell(shapes, partition, key, sources))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TagMask;

    fn build(shapes: &[ShapeSnapshot], cell: f32) -> Partition {
        let mut p = Partition::new();
        p.build(shapes, cell, false);
        p
    }

    #[test]
    fn test_overlapping_pair_found_in_both_directions() {
        let tags = TagMask::new(1, 1);
        let shapes = vec![
            ShapeSnapshot::circle(10, 1, Vec2::new(0.2, 0.2), 0.3, tags),
            ShapeSnapshot::circle(11, 2, Vec2::new(0.6, 0.2), 0.3, tags),
        ];
        let p = build(&shapes, 1.0);
        let pairs = find_candidates(&shapes, &p, true);
        assert!(pairs.iter().any(|c| c.source == 0 && c.target == 1));
        assert!(pairs.iter().any(|c| c.source == 1 && c.target == 0));
        assert!(pairs.iter().all(|c| c.source != c.target));
    }

    #[test]
    fn test_pair_across_cell_boundary_is_found() {
        let tags = TagMask::new(1, 1);
        let shapes = vec![
            ShapeSnapshot::circle(1, 1, Vec2::new(0.9, 0.5), 0.2, tags),
            ShapeSnapshot::circle(2, 2, Vec2::new(1.1, 0.5), 0.2, tags),
        ];
        let p = build(&shapes, 1.0);
        let pairs = find_candidates(&shapes, &p, false);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_tag_mismatch_produces_nothing() {
        let shapes = vec![
            ShapeSnapshot::circle(1, 1, Vec2::ZERO, 0.3, TagMask::new(0b01, 0b10)),
            ShapeSnapshot::circle(2, 2, Vec2::ZERO, 0.3, TagMask::new(0b01, 0b10)),
        ];
        let p = build(&shapes, 1.0);
        assert!(find_candidates(&shapes, &p, true).is_empty());
    }

    #[test]
    fn test_one_sided_tags_emit_one_direction() {
        let shapes = vec![
            ShapeSnapshot::circle(1, 1, Vec2::ZERO, 0.3, TagMask::new(0b01, 0b10)),
            ShapeSnapshot::circle(2, 2, Vec2::ZERO, 0.3, TagMask::new(0b10, 0b00)),
        ];
        let p = build(&shapes, 1.0);
        let pairs = find_candidates(&shapes, &p, false);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].source, pairs[0].target), (0, 1));
    }

    #[test]
    fn test_edge_touching_bounds_are_rejected() {
        let tags = TagMask::new(1, 1);
        let shapes = vec![
            ShapeSnapshot::rect(1, 1, Vec2::new(0.25, 0.5), Vec2::splat(0.25), tags),
            ShapeSnapshot::rect(2, 2, Vec2::new(0.75, 0.5), Vec2::splat(0.25), tags),
        ];
        let p = build(&shapes, 1.0);
        assert!(find_candidates(&shapes, &p, true).is_empty());
    }

    #[test]
    fn test_same_collider_id_is_skipped() {
        let tags = TagMask::new(1, 1);
        let shapes = vec![ShapeSnapshot::circle(5, 1, Vec2::ZERO, 0.3, tags)];
        let p = build(&shapes, 1.0);
        assert!(find_candidates(&shapes, &p, false).is_empty());
    }
}
