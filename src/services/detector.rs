//! The producer loop: acquire, classify, commit, route
//!
//! Runs on a fixed cadence. A missed frame or a classification failure is
//! logged and counted, and the cycle ends with no state change - the last
//! committed tracker state stays queryable throughout. Shutdown arrives on
//! a watch channel and never discards committed state.

use crate::domain::types::{Slot, SlotId, StateChange};
use crate::infra::metrics::Metrics;
use crate::io::calibration::LotLayout;
use crate::io::egress::{Egress, LotRecord};
use crate::io::frames::FrameSource;
use crate::io::vehicles::VehicleSource;
use crate::services::classifier::OccupancyClassifier;
use crate::services::router::Router;
use crate::services::tracker::SlotTracker;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

pub struct Detector {
    frames: Box<dyn FrameSource>,
    vehicles: Box<dyn VehicleSource>,
    classifier: OccupancyClassifier,
    router: Router,
    tracker: Arc<SlotTracker>,
    layout: Arc<LotLayout>,
    egress: Egress,
    metrics: Arc<Metrics>,
    poll_interval: Duration,
}

impl Detector {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frames: Box<dyn FrameSource>,
        vehicles: Box<dyn VehicleSource>,
        classifier: OccupancyClassifier,
        router: Router,
        tracker: Arc<SlotTracker>,
        layout: Arc<LotLayout>,
        egress: Egress,
        metrics: Arc<Metrics>,
        poll_interval_ms: u64,
    ) -> Self {
        Self {
            frames,
            vehicles,
            classifier,
            router,
            tracker,
            layout,
            egress,
            metrics,
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    /// Run until the shutdown channel flips to true
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.run_cycle().await;
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("detector_stopped");
    }

    /// One acquire-classify-commit-route pass
    pub(crate) async fn run_cycle(&mut self) {
        let cycle_start = Instant::now();

        let Some(mask) = self.frames.next_mask().await else {
            self.metrics.record_frame_miss();
            debug!("frame_unavailable");
            return;
        };

        let snapshot = match self.classifier.classify_all(&mask, &self.layout.slots) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.metrics.record_classify_error();
                warn!(slot_id = %e.slot_id, error = %e.source, "classification_failed");
                return;
            }
        };

        let now_unix = Utc::now().timestamp();
        let (report, events) = self.tracker.update_at(&snapshot, now_unix);
        self.metrics.record_transitions(events.len() as u64);

        for event in &events {
            let status = match event.change {
                StateChange::Occupied => "occupied",
                StateChange::Vacated => "free",
            };
            info!(slot_id = %event.slot_id, status = %status, "slot_transition");
            self.egress.write_record(&LotRecord::Transition {
                ts: now_unix,
                slot: event.slot_id.0,
                status: status.to_string(),
            });

            if event.change == StateChange::Vacated {
                self.advise_exit(event.slot_id, now_unix);
            }
        }

        // A vehicle seen inside an entrance asks for the nearest free slot
        let detections = self.vehicles.next_detections().await;
        let at_entrance = detections
            .iter()
            .map(|b| b.centroid())
            .find(|c| self.layout.entrances.iter().any(|g| g.rect.contains(*c)));

        if let Some(vehicle) = at_entrance {
            let free: Vec<Slot> = report
                .free_ids()
                .into_iter()
                .filter_map(|id| self.layout.slot(id).copied())
                .collect();

            if let Some(route) = self.router.nearest_entry(vehicle, &self.layout.entrances, &free)
            {
                self.metrics.record_entry_advisory();
                info!(
                    slot_id = %route.slot_id,
                    entrance = %route.entrance_id,
                    distance_m = %route.estimate.meters,
                    eta_secs = %route.estimate.seconds,
                    "entry_advisory"
                );
                self.egress.write_record(&LotRecord::EntryAdvisory {
                    ts: now_unix,
                    slot: route.slot_id.0,
                    entrance: route.entrance_id.0,
                    distance_m: route.estimate.meters,
                    eta_secs: route.estimate.seconds,
                });
            }
        }

        self.metrics.record_cycle(cycle_start.elapsed().as_micros() as u64);
    }

    fn advise_exit(&self, slot_id: SlotId, now_unix: i64) {
        let Some(slot) = self.layout.slot(slot_id) else { return };

        if let Some(route) = self.router.nearest_exit(slot, &self.layout.exits) {
            self.metrics.record_exit_advisory();
            info!(
                slot_id = %slot_id,
                exit = %route.gate_id,
                distance_m = %route.estimate.meters,
                eta_secs = %route.estimate.seconds,
                "exit_advisory"
            );
            self.egress.write_record(&LotRecord::ExitAdvisory {
                ts: now_unix,
                slot: slot_id.0,
                exit: route.gate_id.0,
                distance_m: route.estimate.meters,
                eta_secs: route.estimate.seconds,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Rect;
    use crate::domain::types::{Gate, GateDirection, GateId, SlotId, SlotStatus};
    use crate::io::vehicles::{BoundingBox, NoDetections};
    use crate::services::router::RoutingParams;
    use async_trait::async_trait;
    use image::{GrayImage, Luma};
    use std::collections::VecDeque;
    use tempfile::tempdir;

    struct ScriptedFrames {
        masks: VecDeque<Option<GrayImage>>,
    }

    #[async_trait]
    impl FrameSource for ScriptedFrames {
        async fn next_mask(&mut self) -> Option<GrayImage> {
            self.masks.pop_front().flatten()
        }
    }

    struct ScriptedVehicles {
        frames: VecDeque<Vec<BoundingBox>>,
    }

    #[async_trait]
    impl VehicleSource for ScriptedVehicles {
        async fn next_detections(&mut self) -> Vec<BoundingBox> {
            self.frames.pop_front().unwrap_or_default()
        }
    }

    /// 200x100 mask; slot 0 at (0,0)-(20,20), slot 1 at (40,0)-(60,20)
    fn layout() -> Arc<LotLayout> {
        Arc::new(LotLayout {
            slots: vec![
                Slot { id: SlotId(0), rect: Rect::new(0, 0, 20, 20).unwrap() },
                Slot { id: SlotId(1), rect: Rect::new(40, 0, 60, 20).unwrap() },
            ],
            entrances: vec![Gate {
                id: GateId(0),
                rect: Rect::new(0, 80, 20, 100).unwrap(),
                direction: GateDirection::Entrance,
            }],
            exits: vec![Gate {
                id: GateId(0),
                rect: Rect::new(180, 80, 200, 100).unwrap(),
                direction: GateDirection::Exit,
            }],
        })
    }

    fn mask_with_slot_filled(slot_rect: &Rect) -> GrayImage {
        let mut mask = GrayImage::new(200, 100);
        for y in slot_rect.y1() as u32..slot_rect.y2() as u32 {
            for x in slot_rect.x1() as u32..slot_rect.x2() as u32 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        mask
    }

    fn detector_with(
        masks: Vec<Option<GrayImage>>,
        vehicles: Box<dyn VehicleSource>,
        egress_path: &str,
    ) -> (Detector, Arc<SlotTracker>) {
        let layout = layout();
        let tracker = Arc::new(SlotTracker::new_at(
            layout.slots.iter().map(|s| s.id).collect(),
            1000,
        ));
        let detector = Detector::new(
            Box::new(ScriptedFrames { masks: masks.into_iter().collect() }),
            vehicles,
            OccupancyClassifier::new(100),
            Router::new(RoutingParams { pixels_per_meter: 40.0, speed_mps: 2.5 }),
            tracker.clone(),
            layout,
            Egress::new(egress_path),
            Arc::new(Metrics::new()),
            500,
        );
        (detector, tracker)
    }

    fn egress_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                content.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
            }
            Err(_) => Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_cycle_commits_classification() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let occupied = mask_with_slot_filled(&Rect::new(0, 0, 20, 20).unwrap());

        let (mut detector, tracker) =
            detector_with(vec![Some(occupied)], Box::new(NoDetections), path.to_str().unwrap());
        detector.run_cycle().await;

        let report = tracker.status();
        assert_eq!(report.status, vec![SlotStatus::Occupied, SlotStatus::Free]);
        assert_eq!(report.generation, 1);
    }

    #[tokio::test]
    async fn test_frame_miss_keeps_last_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let occupied = mask_with_slot_filled(&Rect::new(0, 0, 20, 20).unwrap());

        let (mut detector, tracker) = detector_with(
            vec![Some(occupied), None],
            Box::new(NoDetections),
            path.to_str().unwrap(),
        );
        detector.run_cycle().await;
        let before = tracker.status();

        detector.run_cycle().await;
        let after = tracker.status();

        // No frame: no commit, same generation, same state
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_exit_advisory_once_per_vacated_transition() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let occupied = mask_with_slot_filled(&Rect::new(0, 0, 20, 20).unwrap());
        let empty = GrayImage::new(200, 100);

        let (mut detector, _) = detector_with(
            vec![Some(occupied), Some(empty.clone()), Some(empty)],
            Box::new(NoDetections),
            path.to_str().unwrap(),
        );
        detector.run_cycle().await; // slot 0 occupied
        detector.run_cycle().await; // slot 0 vacated -> advisory
        detector.run_cycle().await; // still free -> nothing

        let advisories: Vec<_> =
            egress_lines(&path).into_iter().filter(|v| v["t"] == "exit_advisory").collect();
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0]["slot"], 0);
        assert_eq!(advisories[0]["exit"], 0);
    }

    #[tokio::test]
    async fn test_entry_advisory_for_vehicle_in_entrance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let empty = GrayImage::new(200, 100);

        // Centroid (10, 90) sits inside the entrance rectangle
        let vehicles = ScriptedVehicles {
            frames: VecDeque::from(vec![vec![BoundingBox { x: 5, y: 85, width: 10, height: 10 }]]),
        };
        let (mut detector, _) = detector_with(
            vec![Some(empty)],
            Box::new(vehicles),
            path.to_str().unwrap(),
        );
        detector.run_cycle().await;

        let advisories: Vec<_> =
            egress_lines(&path).into_iter().filter(|v| v["t"] == "entry_advisory").collect();
        assert_eq!(advisories.len(), 1);
        // Slot 0 center (10,10) is nearer the entrance center (10,90) than slot 1
        assert_eq!(advisories[0]["slot"], 0);
    }

    #[tokio::test]
    async fn test_vehicle_outside_entrance_no_advisory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let empty = GrayImage::new(200, 100);

        let vehicles = ScriptedVehicles {
            frames: VecDeque::from(vec![vec![BoundingBox {
                x: 100,
                y: 10,
                width: 10,
                height: 10,
            }]]),
        };
        let (mut detector, _) = detector_with(
            vec![Some(empty)],
            Box::new(vehicles),
            path.to_str().unwrap(),
        );
        detector.run_cycle().await;

        let advisories: Vec<_> =
            egress_lines(&path).into_iter().filter(|v| v["t"] == "entry_advisory").collect();
        assert!(advisories.is_empty());
    }

    #[tokio::test]
    async fn test_undersized_mask_degrades_to_no_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        // 10x10 mask cannot contain slot 1's rectangle
        let tiny = GrayImage::new(10, 10);
        let (mut detector, tracker) =
            detector_with(vec![Some(tiny)], Box::new(NoDetections), path.to_str().unwrap());
        detector.run_cycle().await;

        let report = tracker.status();
        assert_eq!(report.generation, 0);
        assert_eq!(report.status, vec![SlotStatus::Free, SlotStatus::Free]);
    }
}
