//! Domain models - core business types
//!
//! This module contains the canonical data types used throughout the system:
//! - `Rect` / `Point` - calibration geometry and distance math
//! - `Slot` / `Gate` - monitored spaces and routing gates with stable ids
//! - `OccupancySnapshot` - one classification cycle's verdicts
//! - `StatusReport` - the consistent read-only status projection
//! - `SlotEvent` - observed free/occupied state flips

pub mod geometry;
pub mod types;
