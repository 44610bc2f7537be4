//! Authoritative per-slot occupancy state
//!
//! The tracker is the single shared mutable resource in the system: one
//! producer commits classification snapshots, any number of readers query
//! status. Updates follow a snapshot/commit discipline - all diffs are
//! computed and applied, the commit generation bumped, and the report built
//! inside one write section - so a reader sees either the entire pre-update
//! state or the entire post-update state, never a mix.


use crate::domain::types::{
    OccupancySnapshot, SlotEvent, SlotId, SlotStatus, StateChange, StatusReport,
};
use chrono::Utc;
use parking_lot::RwLock;
use smallvec::SmallVec;

/// Per-slot occupancy and last observed flip time
#[derive(Debug, Clone, Copy)]
struct SlotState {
    occupied: bool,
    /// Unix seconds; moves only when `occupied` flips
    last_changed: i64,
}

struct TrackerState {
    /// Indexed by slot id; exactly one entry per registry slot
    states: Vec<SlotState>,
    /// Bumped once per committed update
    generation: u64,
}

impl TrackerState {
    fn build_report(&self, slot_ids: &[SlotId]) -> StatusReport {
        StatusReport {
            generation: self.generation,
            slot_ids: slot_ids.iter().map(|id| id.0).collect(),
            status: self.states.iter().map(|s| SlotStatus::from_occupied(s.occupied)).collect(),
            last_changed: self.states.iter().map(|s| s.last_changed).collect(),
        }
    }
}

/// Tracks current occupancy and last-change time for every registered slot
pub struct SlotTracker {
    /// Registry order, fixed at construction
    slot_ids: Vec<SlotId>,
    inner: RwLock<TrackerState>,
}

impl SlotTracker {
    /// All slots start free, with `last_changed` set to construction time
    pub fn new(slot_ids: Vec<SlotId>) -> Self {
        Self::new_at(slot_ids, Utc::now().timestamp())
    }

    pub fn new_at(slot_ids: Vec<SlotId>, now_unix: i64) -> Self {
        let states =
            vec![SlotState { occupied: false, last_changed: now_unix }; slot_ids.len()];
        Self { slot_ids, inner: RwLock::new(TrackerState { states, generation: 0 }) }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_ids.len()
    }

    /// Commit one classification cycle
    ///
    /// Slots whose verdict differs from the stored state flip and get
    /// `last_changed = now`; matching verdicts leave both fields untouched.
    /// Returns the post-commit report and the flip events, in slot-id order.
    pub fn update(&self, snapshot: &OccupancySnapshot) -> (StatusReport, SmallVec<[SlotEvent; 8]>) {
        self.update_at(snapshot, Utc::now().timestamp())
    }

    pub fn update_at(
        &self,
        snapshot: &OccupancySnapshot,
        now_unix: i64,
    ) -> (StatusReport, SmallVec<[SlotEvent; 8]>) {
        let mut inner = self.inner.write();

        // Phase 1: diff every slot against the stored state
        let mut flips: SmallVec<[(usize, SlotEvent); 8]> = SmallVec::new();
        for (idx, id) in self.slot_ids.iter().enumerate() {
            let Some(next) = snapshot.get(*id) else { continue };
            if next != inner.states[idx].occupied {
                let change =
                    if next { StateChange::Occupied } else { StateChange::Vacated };
                flips.push((idx, SlotEvent { slot_id: *id, change }));
            }
        }

        // Phase 2: commit all flips, then publish one generation
        for (idx, event) in &flips {
            let state = &mut inner.states[*idx];
            state.occupied = event.change == StateChange::Occupied;
            state.last_changed = now_unix;
        }
        inner.generation += 1;

        let events = flips.into_iter().map(|(_, event)| event).collect();
        (inner.build_report(&self.slot_ids), events)
    }

    /// Consistent read-only projection of the last committed state
    pub fn status(&self) -> StatusReport {
        self.inner.read().build_report(&self.slot_ids)
    }
}
