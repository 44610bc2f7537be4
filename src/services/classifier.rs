//! Occupancy classification from binarized foreground masks
//!
//! A slot region with at least `occupied_threshold` foreground (non-zero)
//! pixels counts as occupied; the comparison is inclusive. The threshold is
//! resolution- and camera-specific and comes from configuration.
//!
//! A slot rectangle that does not fit inside the mask is an explicit error.
//! Silently cropping would under-count foreground pixels and report phantom
//! free slots.

use crate::domain::geometry::Rect;
use crate::domain::types::{OccupancySnapshot, Slot, SlotId};
use image::GrayImage;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("rectangle {rect} exceeds mask bounds {width}x{height}")]
pub struct MaskBoundsError {
    pub rect: Rect,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
#[error("slot {slot_id} cannot be classified")]
pub struct SlotClassifyError {
    pub slot_id: SlotId,
    #[source]
    pub source: MaskBoundsError,
}

/// Stateless free/occupied verdict for one slot region
#[derive(Debug, Clone, Copy)]
pub struct OccupancyClassifier {
    occupied_threshold: u32,
}

impl OccupancyClassifier {
    pub fn new(occupied_threshold: u32) -> Self {
        Self { occupied_threshold }
    }

    pub fn occupied_threshold(&self) -> u32 {
        self.occupied_threshold
    }

    /// Classify one slot region of the mask
    ///
    /// Returns `true` (occupied) when the foreground pixel count meets or
    /// exceeds the threshold.
    pub fn classify(&self, mask: &GrayImage, rect: &Rect) -> Result<bool, MaskBoundsError> {
        let (width, height) = mask.dimensions();
        if rect.x1() < 0
            || rect.y1() < 0
            || rect.x2() as i64 > width as i64
            || rect.y2() as i64 > height as i64
        {
            return Err(MaskBoundsError { rect: *rect, width, height });
        }

        let mut count: u32 = 0;
        for y in rect.y1() as u32..rect.y2() as u32 {
            for x in rect.x1() as u32..rect.x2() as u32 {
                if mask.get_pixel(x, y)[0] != 0 {
                    count += 1;
                }
            }
        }

        Ok(count >= self.occupied_threshold)
    }

    /// Classify every slot in registry order into a snapshot
    pub fn classify_all(
        &self,
        mask: &GrayImage,
        slots: &[Slot],
    ) -> Result<OccupancySnapshot, SlotClassifyError> {
        let mut snapshot = OccupancySnapshot::with_capacity(slots.len());
        for slot in slots {
            let occupied = self
                .classify(mask, &slot.rect)
                .map_err(|source| SlotClassifyError { slot_id: slot.id, source })?;
            snapshot.set(slot.id, occupied);
        }
        Ok(snapshot)
    }
}
