//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `calibration` - rectangle list loading/writing (slots, entrances, exits)
//! - `frames` - binarized mask acquisition boundary and directory replay
//! - `vehicles` - vehicle detector boundary and recorded-detection replay
//! - `egress` - transition/advisory output to file (JSONL format)

pub mod calibration;
pub mod egress;
pub mod frames;
pub mod vehicles;

// Re-export commonly used types
pub use calibration::{CalibrationError, LotLayout};
pub use egress::{Egress, LotRecord};
pub use frames::{FrameSource, MaskSequence};
pub use vehicles::{BoundingBox, DetectionFeed, NoDetections, VehicleSource};
