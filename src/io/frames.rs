//! Frame acquisition boundary
//!
//! The camera and binarization chain live outside this crate; what arrives
//! here is the preprocessed foreground mask (non-zero = foreground pixel).
//! A source that cannot produce a frame returns `None` - the detector keeps
//! the last committed state and tries again on the next tick.

use async_trait::async_trait;
use image::GrayImage;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Supplies binarized foreground masks on demand
#[async_trait]
pub trait FrameSource: Send {
    /// The next mask, or `None` when no new frame is available
    async fn next_mask(&mut self) -> Option<GrayImage>;
}

/// Replays a directory of preprocessed mask images in sorted filename order
///
/// Stands in for the live camera chain during development and analysis runs.
/// When the sequence is exhausted and looping is off, every further call
/// reports "no new frame".
pub struct MaskSequence {
    files: Vec<PathBuf>,
    cursor: usize,
    loop_replay: bool,
}

impl MaskSequence {
    pub fn from_dir(dir: &std::path::Path, loop_replay: bool) -> std::io::Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        debug!(dir = %dir.display(), frames = %files.len(), "mask_sequence_opened");
        Ok(Self { files, cursor: 0, loop_replay })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FrameSource for MaskSequence {
    async fn next_mask(&mut self) -> Option<GrayImage> {
        if self.files.is_empty() {
            return None;
        }
        if self.cursor >= self.files.len() {
            if !self.loop_replay {
                return None;
            }
            self.cursor = 0;
        }

        let path = &self.files[self.cursor];
        self.cursor += 1;

        match image::open(path) {
            Ok(img) => Some(img.to_luma8()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "mask_decode_failed");
                None
            }
        }
    }
}
