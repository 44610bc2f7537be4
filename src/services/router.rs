//! Nearest-slot and nearest-exit routing
//!
//! Distances are Euclidean between rectangle centers, in mask pixels,
//! converted to meters and seconds with the configured scale and speed.
//! Both operations are pure; "nothing to route to" is an absent result,
//! not an error.

use crate::domain::geometry::Point;
use crate::domain::types::{Gate, GateDirection, GateId, Slot, SlotId};

/// Scene-specific conversion constants
#[derive(Debug, Clone, Copy)]
pub struct RoutingParams {
    pub pixels_per_meter: f64,
    pub speed_mps: f64,
}

/// Distance and travel-time estimate for one route
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelEstimate {
    pub distance_px: f64,
    pub meters: f64,
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryRoute {
    pub slot_id: SlotId,
    pub entrance_id: GateId,
    pub estimate: TravelEstimate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRoute {
    pub gate_id: GateId,
    pub estimate: TravelEstimate,
}

pub struct Router {
    params: RoutingParams,
}

impl Router {
    pub fn new(params: RoutingParams) -> Self {
        Self { params }
    }

    fn estimate(&self, distance_px: f64) -> TravelEstimate {
        let meters = distance_px / self.params.pixels_per_meter;
        TravelEstimate { distance_px, meters, seconds: meters / self.params.speed_mps }
    }

    /// Nearest free slot for a vehicle observed at an entrance
    ///
    /// The vehicle must sit inside some entrance rectangle (edges count);
    /// the winning pair minimizes entrance-center to slot-center distance
    /// over every (entrance, free slot) combination. Ties go to the first
    /// pair encountered in entrance order, then slot order - arbitrary but
    /// deterministic.
    pub fn nearest_entry(
        &self,
        vehicle: Point,
        entrances: &[Gate],
        free_slots: &[Slot],
    ) -> Option<EntryRoute> {
        let entrances: Vec<&Gate> =
            entrances.iter().filter(|g| g.direction == GateDirection::Entrance).collect();

        if !entrances.iter().any(|g| g.rect.contains(vehicle)) {
            return None;
        }

        let mut best: Option<EntryRoute> = None;
        for gate in &entrances {
            let origin = gate.rect.center();
            for slot in free_slots {
                let distance_px = origin.distance(slot.rect.center());
                if best.map_or(true, |b| distance_px < b.estimate.distance_px) {
                    best = Some(EntryRoute {
                        slot_id: slot.id,
                        entrance_id: gate.id,
                        estimate: self.estimate(distance_px),
                    });
                }
            }
        }
        best
    }

    /// Nearest exit gate for a slot that just went free
    ///
    /// Called once per observed occupied-to-free transition.
    pub fn nearest_exit(&self, freed_slot: &Slot, exits: &[Gate]) -> Option<ExitRoute> {
        let origin = freed_slot.rect.center();

        let mut best: Option<ExitRoute> = None;
        for gate in exits.iter().filter(|g| g.direction == GateDirection::Exit) {
            let distance_px = origin.distance(gate.rect.center());
            if best.map_or(true, |b| distance_px < b.estimate.distance_px) {
                best = Some(ExitRoute { gate_id: gate.id, estimate: self.estimate(distance_px) });
            }
        }
        best
    }
}
