//! Double-buffered pair history used to tell new contacts from continuing ones.

use std::collections::HashSet;

use crate::types::PairId;

/// Two pair sets that trade roles every step. Only one step of history is kept.
#[derive(Debug, Default, Clone)]
pub struct ContactHistory {
    frames: [HashSet<PairId>; 2],
    current: usize,
}

impl ContactHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new step: the current set becomes the previous one and the
    /// old previous set is cleared for reuse as the new current set.
    pub fn advance(&mut self) {
        self.current ^= 1;
        self.frames[self.current].clear();
    }

    pub fn current(&self) -> &HashSet<PairId> {
        &self.frames[self.current]
    }

    pub fn previous(&self) -> &HashSet<PairId> {
        &self.frames[self.current ^ 1]
    }

    /// Was the pair colliding in the previous step?
    pub fn was_colliding(&self, id: PairId) -> bool {
        self.previous().contains(&id)
    }

    pub fn is_colliding(&self, id: PairId) -> bool {
        self.current().contains(&id)
    }

    /// Mark a pair as colliding this step. Returns false if it was already marked.
    pub fn record(&mut self, id: PairId) -> bool {
        self.frames[self.current].insert(id)
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = PairId>) {
        self.frames[self.current].extend(ids);
    }

    /// Forget both steps; every pair will read as new afterwards.
    pub fn reset(&mut self) {
        self.frames[0].clear();
        self.frames[1].clear();
    }
}
