//! Calibration file loading and writing
//!
//! The drawing tools author three rectangle lists (slots, entrances, exits),
//! one rectangle per line as four whitespace-separated integers. Ids are
//! assigned by 0-based line position and stay stable for the process
//! lifetime. The written format round-trips integer-exact with the loader.
//!
//! A malformed line aborts the load; skipping it would silently renumber
//! every slot that follows.

use crate::domain::geometry::Rect;
use crate::domain::types::{Gate, GateDirection, GateId, Slot, SlotId};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("calibration file not found: {path}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("calibration file {path}, line {line}: expected four integers, got {content:?}")]
    Malformed { path: PathBuf, line: usize, content: String },
}

/// Parse a rectangle list, one `x1 y1 x2 y2` per line
///
/// Blank lines are rejected like any other malformed line; the authoring
/// tools never write them.
fn load_rectangles(path: &Path) -> Result<Vec<Rect>, CalibrationError> {
    let content = fs::read_to_string(path)
        .map_err(|source| CalibrationError::Missing { path: path.to_path_buf(), source })?;

    let mut rects = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let malformed = || CalibrationError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            content: line.to_string(),
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 4 {
            return Err(malformed());
        }

        let mut fields = [0i32; 4];
        for (field, part) in fields.iter_mut().zip(&parts) {
            *field = part.parse().map_err(|_| malformed())?;
        }

        let rect = Rect::new(fields[0], fields[1], fields[2], fields[3]).map_err(|_| malformed())?;
        rects.push(rect);
    }

    Ok(rects)
}

/// Write a rectangle list in the authoring tools' format
pub fn write_rectangles(path: &Path, rects: &[Rect]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = fs::File::create(path)?;
    for rect in rects {
        writeln!(file, "{} {} {} {}", rect.x1(), rect.y1(), rect.x2(), rect.y2())?;
    }
    Ok(())
}

/// Load the monitored slot list; absence is an error the caller treats as fatal
pub fn load_slots(path: &Path) -> Result<Vec<Slot>, CalibrationError> {
    let slots: Vec<Slot> = load_rectangles(path)?
        .into_iter()
        .enumerate()
        .map(|(idx, rect)| Slot { id: SlotId(idx as u32), rect })
        .collect();

    info!(path = %path.display(), slots = %slots.len(), "slots_loaded");
    Ok(slots)
}

/// Load a gate list with the given direction tag
pub fn load_gates(path: &Path, direction: GateDirection) -> Result<Vec<Gate>, CalibrationError> {
    let gates: Vec<Gate> = load_rectangles(path)?
        .into_iter()
        .enumerate()
        .map(|(idx, rect)| Gate { id: GateId(idx as u32), rect, direction })
        .collect();

    info!(
        path = %path.display(),
        direction = %direction.as_str(),
        gates = %gates.len(),
        "gates_loaded"
    );
    Ok(gates)
}

/// Load a gate list, treating a missing file as zero gates
///
/// Malformed content is still an error; only absence degrades.
pub fn load_gates_or_empty(
    path: &Path,
    direction: GateDirection,
) -> Result<Vec<Gate>, CalibrationError> {
    match load_gates(path, direction) {
        Ok(gates) => Ok(gates),
        Err(CalibrationError::Missing { path, .. }) => {
            warn!(
                path = %path.display(),
                direction = %direction.as_str(),
                "gate_file_missing_assuming_none"
            );
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// The immutable-after-load lot definition
#[derive(Debug, Clone)]
pub struct LotLayout {
    pub slots: Vec<Slot>,
    pub entrances: Vec<Gate>,
    pub exits: Vec<Gate>,
}

impl LotLayout {
    /// Load the full layout: slots are required, gate files may be absent
    pub fn load(
        slots_file: &Path,
        entrances_file: &Path,
        exits_file: &Path,
    ) -> Result<Self, CalibrationError> {
        let slots = load_slots(slots_file)?;
        let entrances = load_gates_or_empty(entrances_file, GateDirection::Entrance)?;
        let exits = load_gates_or_empty(exits_file, GateDirection::Exit)?;
        Ok(Self { slots, entrances, exits })
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(id.0 as usize)
    }
}
