//! Shared types for the lot monitor
//!
//! Slots and gates are created once at calibration load and never mutated.
//! Identity is the positional id assigned by the loader, never re-derived
//! from rectangle coordinates.

use crate::domain::geometry::Rect;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Newtype wrapper for parking slot ids to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SlotId(pub u32);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for gate ids to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct GateId(pub u32);

impl std::fmt::Display for GateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monitored parking space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDirection {
    Entrance,
    Exit,
}

impl GateDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateDirection::Entrance => "entrance",
            GateDirection::Exit => "exit",
        }
    }
}

/// An entrance or exit region used for routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub id: GateId,
    pub rect: Rect,
    pub direction: GateDirection,
}

/// One classification cycle's verdicts, keyed by slot id
///
/// Built once per cycle by the classifier sweep and handed to the tracker;
/// not mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct OccupancySnapshot {
    flags: FxHashMap<SlotId, bool>,
}

impl OccupancySnapshot {
    pub fn with_capacity(n: usize) -> Self {
        Self { flags: FxHashMap::with_capacity_and_hasher(n, Default::default()) }
    }

    pub fn set(&mut self, id: SlotId, occupied: bool) {
        self.flags.insert(id, occupied);
    }

    pub fn get(&self, id: SlotId) -> Option<bool> {
        self.flags.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<(SlotId, bool)> for OccupancySnapshot {
    fn from_iter<T: IntoIterator<Item = (SlotId, bool)>>(iter: T) -> Self {
        Self { flags: iter.into_iter().collect() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Free,
    Occupied,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Free => "free",
            SlotStatus::Occupied => "occupied",
        }
    }

    pub fn from_occupied(occupied: bool) -> Self {
        if occupied {
            SlotStatus::Occupied
        } else {
            SlotStatus::Free
        }
    }
}

/// Read-only projection of tracker state at a single commit point
///
/// The three sequences are parallel and ordered by slot id. `generation`
/// identifies the commit that produced the report; every field in one report
/// belongs to the same commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub generation: u64,
    pub slot_ids: Vec<u32>,
    pub status: Vec<SlotStatus>,
    /// Unix seconds of the last observed state flip per slot
    pub last_changed: Vec<i64>,
}

impl StatusReport {
    /// Slot ids currently reported free, in id order
    pub fn free_ids(&self) -> Vec<SlotId> {
        self.slot_ids
            .iter()
            .zip(&self.status)
            .filter(|(_, s)| **s == SlotStatus::Free)
            .map(|(id, _)| SlotId(*id))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Slot went free -> occupied
    Occupied,
    /// Slot went occupied -> free
    Vacated,
}

impl StateChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateChange::Occupied => "occupied",
            StateChange::Vacated => "vacated",
        }
    }
}

/// Emitted by the tracker for every observed state flip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEvent {
    pub slot_id: SlotId,
    pub change: StateChange,
}
