//! Vehicle detection boundary
//!
//! The detection cascade itself is external; this crate only consumes its
//! output, a list of candidate bounding boxes per frame. Routing cares about
//! each box's centroid and whether it falls inside an entrance rectangle.

use crate::domain::geometry::Point;
use async_trait::async_trait;
use std::fs;
use tracing::warn;

/// A candidate vehicle box as reported by the external detector (x, y, w, h)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn centroid(&self) -> Point {
        Point::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Supplies candidate vehicle boxes for the current frame
#[async_trait]
pub trait VehicleSource: Send {
    async fn next_detections(&mut self) -> Vec<BoundingBox>;
}

/// Null source for deployments without a vehicle detector
pub struct NoDetections;

#[async_trait]
impl VehicleSource for NoDetections {
    async fn next_detections(&mut self) -> Vec<BoundingBox> {
        Vec::new()
    }
}

/// Replays recorded detector output from a JSONL file
///
/// One line per frame: `[[x,y,w,h], ...]`. Runs alongside `MaskSequence`
/// replay; once the lines run out every frame has zero detections.
pub struct DetectionFeed {
    frames: Vec<Vec<BoundingBox>>,
    cursor: usize,
}

impl DetectionFeed {
    pub fn from_file(path: &std::path::Path) -> std::io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut frames = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            match serde_json::from_str::<Vec<[i64; 4]>>(line) {
                Ok(raw) => frames.push(
                    raw.into_iter()
                        .map(|[x, y, w, h]| BoundingBox {
                            x: x as i32,
                            y: y as i32,
                            width: w.max(0) as u32,
                            height: h.max(0) as u32,
                        })
                        .collect(),
                ),
                Err(e) => {
                    warn!(path = %path.display(), line = %(idx + 1), error = %e, "detection_line_skipped");
                    frames.push(Vec::new());
                }
            }
        }

        Ok(Self { frames, cursor: 0 })
    }
}

#[async_trait]
impl VehicleSource for DetectionFeed {
    async fn next_detections(&mut self) -> Vec<BoundingBox> {
        let boxes = self.frames.get(self.cursor).cloned().unwrap_or_default();
        self.cursor += 1;
        boxes
    }
}
