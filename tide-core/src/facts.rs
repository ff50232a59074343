//! Per-timestep ground-atom storage
//!
//! Each timestep of the bounded horizon owns a set of ground atoms with
//! atomic test-and-insert, so parallel rule firings racing on the same slot
//! still report "newly added" exactly once per atom per timestep. A
//! per-slot predicate index is maintained alongside for indexed matching.

use crate::interval::Timestep;
use crate::reasoner::types::{Atom, TimedFact};
use dashmap::{DashMap, DashSet};
use std::sync::Arc;

/// Ground atoms held at each timestep in `[0, horizon]`.
///
/// Accessors return owned snapshots: matching iterates a snapshot while the
/// engine inserts into live sets, which keeps the concurrent maps free of
/// re-entrant locking.
pub struct TimelineStore {
    horizon: Timestep,
    slots: Vec<TimeSlot>,
}

#[derive(Default)]
struct TimeSlot {
    atoms: DashSet<Atom>,
    by_predicate: DashMap<Arc<str>, Vec<Atom>>,
    // Atoms materialized from base facts. A rule re-deriving one of these
    // must not leave a derivation record, or the base/derived distinction
    // breaks.
    base_atoms: DashSet<Atom>,
}

impl TimelineStore {
    /// Create an empty store covering `[0, horizon]`
    pub fn new(horizon: Timestep) -> Self {
        TimelineStore {
            horizon,
            slots: (0..=horizon).map(|_| TimeSlot::default()).collect(),
        }
    }

    /// The horizon `T`
    pub fn horizon(&self) -> Timestep {
        self.horizon
    }

    /// Materialize a base fact at every timestep its intervals cover,
    /// clamped to the horizon.
    pub fn add_base(&self, fact: &TimedFact) {
        for interval in &fact.intervals {
            for t in interval.timesteps(self.horizon) {
                self.insert_base(fact.atom.clone(), t);
            }
        }
    }

    /// Insert a single base atom at `t`; true iff it was not already present
    pub fn insert_base(&self, atom: Atom, t: Timestep) -> bool {
        self.slots[t].base_atoms.insert(atom.clone());
        self.insert(atom, t)
    }

    /// Whether `(atom, t)` was materialized from a base fact
    pub fn is_base(&self, atom: &Atom, t: Timestep) -> bool {
        self.slots[t].base_atoms.contains(atom)
    }

    /// Insert an atom at `t`; true iff it was not already present
    pub fn insert(&self, atom: Atom, t: Timestep) -> bool {
        let slot = &self.slots[t];
        if slot.atoms.insert(atom.clone()) {
            slot.by_predicate
                .entry(atom.predicate.clone())
                .or_default()
                .push(atom);
            true
        } else {
            false
        }
    }

    /// Membership test at `t`
    pub fn contains(&self, atom: &Atom, t: Timestep) -> bool {
        self.slots[t].atoms.contains(atom)
    }

    /// Snapshot of all atoms true at `t`
    pub fn at(&self, t: Timestep) -> Vec<Atom> {
        self.slots[t].atoms.iter().map(|e| e.key().clone()).collect()
    }

    /// Snapshot of atoms with the given predicate at `t`
    pub fn with_predicate(&self, t: Timestep, predicate: &str) -> Vec<Atom> {
        self.slots[t]
            .by_predicate
            .get(predicate)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Number of atoms at `t`
    pub fn len_at(&self, t: Timestep) -> usize {
        self.slots[t].atoms.len()
    }

    /// Total atom count across all timesteps
    pub fn total(&self) -> usize {
        self.slots.iter().map(|s| s.atoms.len()).sum()
    }

    /// Check if the store holds no atoms at all
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
