//! Uniform grid hashing of shape bounds.
//!
//! Every regular shape lands once in the source index (at the cell holding its
//! bounds center) and once per covered cell in the target index, where the
//! covered range is padded by one cell on every side. Shapes wider or taller
//! than a cell are routed to a side list instead.

use std::collections::HashMap;

use glam::{IVec2, Vec2};
use rayon::prelude::*;

use crate::types::ShapeSnapshot;

/// Packed integer cell coordinate.
pub type CellKey = u64;

/// Cell multi-map: cell key -> indices into the step's shape list (ascending).
pub type CellMap = HashMap<CellKey, Vec<usize>>;

pub fn quantize(p: Vec2, cell_size: f32) -> IVec2 {
    IVec2::new((p.x / cell_size).floor() as i32, (p.y / cell_size).floor() as i32)
}

/// Bit patterns of both coordinates side by side; distinct cells never share a key.
pub fn cell_key(cell: IVec2) -> CellKey {
    u64::from(cell.x as u32) | (u64::from(cell.y as u32) << 32)
}

pub fn key_cell(key: CellKey) -> IVec2 {
    IVec2::new(key as u32 as i32, (key >> 32) as u32 as i32)
}

/// Source and target indices plus the oversized side list for one step.
#[derive(Debug, Default)]
pub struct Partition {
    source: CellMap,
    target: CellMap,
    oversized: Vec<usize>,
}

/// One worker's private slice of the indices; merged after the fold.
#[derive(Default)]
struct Shard {
    source: CellMap,
    target: CellMap,
    oversized: Vec<usize>,
}

impl Shard {
    fn insert(mut self, idx: usize, shape: &ShapeSnapshot, cell_size: f32) -> Self {
        let bounds = &shape.bounds;
        if bounds.exceeds(cell_size) {
            self.oversized.push(idx);
            return self;
        }

        let home = quantize(bounds.center(), cell_size);
        self.source.entry(cell_key(home)).or_default().push(idx);

        // Cells at the edge of the i32 range keep their padding on the inner side.
        let lo = quantize(bounds.min, cell_size).saturating_sub(IVec2::ONE);
        let hi = quantize(bounds.max, cell_size).saturating_add(IVec2::ONE);
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                self.target.entry(cell_key(IVec2::new(x, y))).or_default().push(idx);
            }
        }
        self
    }

    // `other` holds later shape indices, so appending keeps each cell list ascending.
    fn merge(mut self, other: Shard) -> Self {
        for (key, list) in other.source {
            self.source.entry(key).or_default().extend(list);
        }
        for (key, list) in other.target {
            self.target.entry(key).or_default().extend(list);
        }
        self.oversized.extend(other.oversized);
        self
    }
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.source.clear();
        self.target.clear();
        self.oversized.clear();
    }

    /// Rebuild both indices from this step's shapes.
    pub fn build(&mut self, shapes: &[ShapeSnapshot], cell_size: f32, parallel: bool) {
        let shard = if parallel {
            shapes
                .par_iter()
                .enumerate()
                .fold(Shard::default, |shard, (i, s)| shard.insert(i, s, cell_size))
                .reduce(Shard::default, Shard::merge)
        } else {
            shapes
                .iter()
                .enumerate()
                .fold(Shard::default(), |shard, (i, s)| shard.insert(i, s, cell_size))
        };
        self.source = shard.source;
        self.target = shard.target;
        self.oversized = shard.oversized;
    }

    pub fn source(&self) -> &CellMap {
        &self.source
    }

    pub fn target(&self) -> &CellMap {
        &self.target
    }

    /// Shapes excluded from the grid. Nothing in the pipeline consumes them.
    pub fn oversized(&self) -> &[usize] {
        &self.oversized
    }

    pub fn source_entries(&self) -> usize {
        self.source.values().map(Vec::len).sum()
    }

    pub fn target_entries(&self) -> usize {
        self.target.values().map(Vec::len).sum()
    }

    pub fn cells(&self) -> usize {
        self.target.len()
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.source.values().chain(self.target.values()).any(|l| l.contains(&idx))
    }
}
