use glam::Vec2;

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug_span, trace, warn};

use crate::api::CollisionWorldApi;
use crate::broadphase::{self, CandidatePair};
use crate::error::CollisionError;
use crate::geometry::Mtv;
use crate::history::ContactHistory;
use crate::narrowphase;
use crate::partition::Partition;
use crate::resolution;
use crate::types::*;

/// Per-step collision pipeline: partition, broad phase, narrow phase, resolution.
///
/// Shapes and contact buffers live for one step; only the pair history and the
/// resolution modes carry over.
pub struct CollisionWorld {
    pub cfg: WorldConfig,
    pub step_counter: u64,

    // Step-local storage
    shapes: Vec<ShapeSnapshot>,
    collider_to_id: HashMap<ColliderId, FrameId>,
    partition: Partition,
    candidates: Vec<CandidatePair>,
    contacts: HashMap<EntityId, Vec<ContactRecord>>,

    // Carried across steps
    history: ContactHistory,
    modes: HashMap<EntityId, ResolutionMode>,

    stats: StepStats,
    last_timing: Option<StepTiming>,
}

fn elapsed_ms(t: Option<Instant>) -> f64 {
    t.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0)
}

impl CollisionWorldApi for CollisionWorld {
    fn new(mut cfg: WorldConfig) -> Self {
        cfg.cell_size = cfg.cell_size.max(1e-5);
        Self {
            cfg,
            step_counter: 0,
            shapes: Vec::new(),
            collider_to_id: HashMap::new(),
            partition: Partition::new(),
            candidates: Vec::new(),
            contacts: HashMap::new(),
            history: ContactHistory::new(),
            modes: HashMap::new(),
            stats: StepStats::default(),
            last_timing: None,
        }
    }

    fn begin_step(&mut self) {
        self.shapes.clear();
        self.collider_to_id.clear();
        self.partition.clear();
        self.candidates.clear();
        self.contacts.clear();
        self.history.advance();
        self.stats = StepStats::default();
        self.last_timing = None;
        self.step_counter = self.step_counter.wrapping_add(1);
    }

    fn push(&mut self, shape: ShapeSnapshot) -> FrameId {
        debug_assert!(shape.validate().is_ok(), "malformed shape: {:?}", shape.validate());
        let id = FrameId(self.shapes.len() as u32);
        debug_assert!(
            !self.collider_to_id.contains_key(&shape.collider),
            "Duplicate collider id encountered within a step"
        );
        self.collider_to_id.insert(shape.collider, id);
        self.shapes.push(shape);
        id
    }

    fn push_circle(
        &mut self,
        collider: ColliderId,
        owner: EntityId,
        center: Vec2,
        radius: f32,
        tags: TagMask,
    ) -> FrameId {
        self.push(ShapeSnapshot::circle(collider, owner, center, radius, tags))
    }

    fn push_polygon(
        &mut self,
        collider: ColliderId,
        owner: EntityId,
        vertices: Vec<Vec2>,
        tags: TagMask,
    ) -> FrameId {
        self.push(ShapeSnapshot::polygon(collider, owner, vertices, tags))
    }

    fn set_resolution_mode(&mut self, entity: EntityId, mode: ResolutionMode) {
        match mode {
            ResolutionMode::None => self.modes.remove(&entity),
            _ => self.modes.insert(entity, mode),
        };
    }

    fn detect(&mut self) {
        let span = debug_span!("detect", step = self.step_counter, shapes = self.shapes.len());
        let _enter = span.enter();
        let timed = self.cfg.enable_timing;
        let parallel = self.cfg.parallel;
        let t_all = timed.then(Instant::now);

        // Buffers only ever hold one pass worth of contacts.
        self.contacts.clear();

        let t0 = timed.then(Instant::now);
        self.partition.build(&self.shapes, self.cfg.cell_size, parallel);
        let partition_ms = elapsed_ms(t0);
        let oversized = self.partition.oversized();
        if let Some(&first) = oversized.first() {
            warn!(
                count = oversized.len(),
                first_collider = self.shapes[first].collider,
                cell_size = self.cfg.cell_size,
                "colliders larger than a grid cell are excluded from detection"
            );
        }
        trace!(
            cells = self.partition.cells(),
            source_entries = self.partition.source_entries(),
            target_entries = self.partition.target_entries(),
            "partitioned"
        );

        let t1 = timed.then(Instant::now);
        self.candidates = broadphase::find_candidates(&self.shapes, &self.partition, parallel);
        let broadphase_ms = elapsed_ms(t1);
        trace!(candidates = self.candidates.len(), "broad phase done");

        let t2 = timed.then(Instant::now);
        let produced = narrowphase::run(&self.shapes, &mut self.candidates, &self.history, parallel);
        let mut contacts = 0;
        let mut new_contacts = 0;
        for group in produced {
            self.history.extend(group.pairs);
            contacts += group.contacts.len();
            new_contacts += group.contacts.iter().filter(|c| c.is_new).count();
            self.contacts.entry(group.owner).or_default().extend(group.contacts);
        }
        let narrowphase_ms = elapsed_ms(t2);
        trace!(contacts, new_contacts, "narrow phase done");

        self.stats = StepStats {
            shapes: self.shapes.len(),
            cells: self.partition.cells(),
            source_entries: self.partition.source_entries(),
            target_entries: self.partition.target_entries(),
            oversized: self.partition.oversized().len(),
            candidates: self.candidates.len(),
            contacts,
            new_contacts,
        };
        if let Some(t_all) = t_all {
            self.last_timing = Some(StepTiming {
                detect_ms: elapsed_ms(Some(t_all)),
                partition_ms,
                broadphase_ms,
                narrowphase_ms,
                ..Default::default()
            });
        }
    }

    fn contacts(&self, entity: EntityId) -> &[ContactRecord] {
        self.contacts.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    fn resolve(&mut self) -> Vec<(EntityId, Correction)> {
        let t0 = self.cfg.enable_timing.then(Instant::now);
        let out = resolution::resolve(&self.contacts, &self.modes, self.cfg.parallel);
        if let Some(t0) = t0 {
            let timing = self.last_timing.get_or_insert_with(StepTiming::default);
            timing.resolve_ms = elapsed_ms(Some(t0));
        }
        trace!(corrections = out.len(), "resolved");
        out
    }

    fn overlap_by_collider(&self, a: ColliderId, b: ColliderId) -> Option<Mtv> {
        let ia = self.collider_to_id.get(&a)?.0 as usize;
        let ib = self.collider_to_id.get(&b)?.0 as usize;
        narrowphase::test_pair(&self.shapes[ia], &self.shapes[ib])
    }
}

impl CollisionWorld {
    /// Like `new`, but rejects an invalid cell size instead of clamping it.
    pub fn try_new(cfg: WorldConfig) -> Result<Self, CollisionError> {
        cfg.validate()?;
        Ok(<Self as CollisionWorldApi>::new(cfg))
    }

    pub fn shape(&self, id: FrameId) -> Option<&ShapeSnapshot> {
        self.shapes.get(id.0 as usize)
    }

    pub fn shapes(&self) -> &[ShapeSnapshot] {
        &self.shapes
    }

    /// Every non-empty contact buffer of the last detection.
    pub fn contact_buffers(&self) -> &HashMap<EntityId, Vec<ContactRecord>> {
        &self.contacts
    }

    /// Candidates of the last detection, grouped by source entity.
    pub fn candidates(&self) -> &[CandidatePair] {
        &self.candidates
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Shapes the grid skipped this step. An orchestrator that needs them must
    /// test them itself (e.g., with `overlap_by_collider`).
    pub fn oversized(&self) -> impl Iterator<Item = &ShapeSnapshot> + '_ {
        self.partition.oversized().iter().map(|&i| &self.shapes[i])
    }

    pub fn history(&self) -> &ContactHistory {
        &self.history
    }

    /// Forget which pairs collided; every contact of the next step reads as new.
    pub fn reset_history(&mut self) {
        self.history.reset();
    }

    pub fn resolution_mode(&self, entity: EntityId) -> ResolutionMode {
        self.modes.get(&entity).copied().unwrap_or_default()
    }

    /// Return debug/perf stats for the last detection.
    pub fn stats(&self) -> StepStats {
        self.stats
    }

    /// Return timing breakdown for the last `detect`/`resolve` runs.
    pub fn timing(&self) -> Option<StepTiming> {
        self.last_timing
    }
}
