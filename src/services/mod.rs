//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `classifier` - free/occupied verdicts from foreground masks
//! - `tracker` - authoritative per-slot state with snapshot/commit updates
//! - `router` - nearest free slot / nearest exit with travel estimates
//! - `detector` - the periodic acquire-classify-commit-route loop

pub mod classifier;
pub mod detector;
pub mod router;
pub mod tracker;

// Re-export commonly used types
pub use classifier::OccupancyClassifier;
pub use detector::Detector;
pub use router::{EntryRoute, ExitRoute, Router, RoutingParams, TravelEstimate};
pub use tracker::SlotTracker;
