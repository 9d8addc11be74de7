//! Push-out of overlapping bodies from their contact buffers.

use std::collections::HashMap;

use glam::Vec2;
use rayon::prelude::*;

use crate::types::{ContactRecord, Correction, EntityId, ResolutionMode};

/// Minimal kinematic state the corrections apply to.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Body {
    pub position: Vec2,
    /// Accumulated force, consumed by the integrator.
    pub force: Vec2,
}

impl Body {
    pub fn apply(&mut self, correction: Correction) {
        match correction {
            Correction::Displace(d) => self.position += d,
            Correction::Force(f) => self.force += f,
        }
    }
}

/// Sum of `normal * depth` over all contacts.
pub fn total_separation(contacts: &[ContactRecord]) -> Vec2 {
    contacts.iter().map(ContactRecord::separation).sum()
}

/// Correction for one entity, or `None` for sensors and empty buffers.
pub fn correction_for(mode: ResolutionMode, contacts: &[ContactRecord]) -> Option<Correction> {
    if contacts.is_empty() {
        return None;
    }
    let separation = total_separation(contacts);
    match mode {
        ResolutionMode::None => None,
        ResolutionMode::MoveOut => Some(Correction::Displace(separation)),
        // Subtracting the penetration (pointing into the other shapes) from the
        // force is adding the separation.
        ResolutionMode::ForceOut => Some(Correction::Force(separation)),
    }
}

/// Corrections for every entity with a resolution mode and at least one contact.
pub fn resolve(
    buffers: &HashMap<EntityId, Vec<ContactRecord>>,
    modes: &HashMap<EntityId, ResolutionMode>,
    parallel: bool,
) -> Vec<(EntityId, Correction)> {
    let one = |(&entity, contacts): (&EntityId, &Vec<ContactRecord>)| {
        let mode = modes.get(&entity).copied().unwrap_or_default();
        correction_for(mode, contacts).map(|c| (entity, c))
    };
    let mut out: Vec<_> = if parallel {
        buffers.par_iter().filter_map(one).collect()
    } else {
        buffers.iter().filter_map(one).collect()
    };
    out.sort_unstable_by_key(|&(e, _)| e);
    out
}

/// Apply corrections to bodies; entities without a body are skipped.
pub fn apply(corrections: &[(EntityId, Correction)], bodies: &mut HashMap<EntityId, Body>) {
    for &(entity, correction) in corrections {
        if let Some(body) = bodies.get_mut(&entity) {
            body.apply(correction);
        }
    }
}
