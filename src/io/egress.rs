//! Event egress - writes transitions and routing advisories to file
//!
//! Records are written in JSONL format (one JSON object per line)
//! to the file specified in config.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// One egressed record
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum LotRecord {
    /// A slot flipped state
    Transition { ts: i64, slot: u32, status: String },
    /// Nearest free slot for a vehicle seen at an entrance
    EntryAdvisory { ts: i64, slot: u32, entrance: u32, distance_m: f64, eta_secs: f64 },
    /// Nearest exit gate for a freshly vacated slot
    ExitAdvisory { ts: i64, slot: u32, exit: u32, distance_m: f64, eta_secs: f64 },
}

/// Egress writer for lot events
pub struct Egress {
    file_path: String,
}

impl Egress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write a record to the egress file
    /// Returns true if successful, false otherwise
    pub fn write_record(&self, record: &LotRecord) -> bool {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "egress_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => true,
            Err(e) => {
                error!(file = %self.file_path, error = %e, "egress_write_failed");
                false
            }
        }
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "egress_written");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_egress_new() {
        let egress = Egress::new("test.jsonl");
        assert_eq!(egress.file_path, "test.jsonl");
    }

    #[test]
    fn test_write_transition_record() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("events.jsonl");
        let file_str = file_path.to_str().unwrap();

        let egress = Egress::new(file_str);
        let record =
            LotRecord::Transition { ts: 1754600000, slot: 3, status: "occupied".to_string() };
        assert!(egress.write_record(&record));

        let content = fs::read_to_string(&file_path).unwrap();
        assert!(content.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["t"], "transition");
        assert_eq!(parsed["slot"], 3);
        assert_eq!(parsed["status"], "occupied");
    }

    #[test]
    fn test_write_advisory_records_append() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("events.jsonl");
        let file_str = file_path.to_str().unwrap();

        let egress = Egress::new(file_str);
        egress.write_record(&LotRecord::EntryAdvisory {
            ts: 1754600000,
            slot: 1,
            entrance: 0,
            distance_m: 2.5,
            eta_secs: 1.0,
        });
        egress.write_record(&LotRecord::ExitAdvisory {
            ts: 1754600001,
            slot: 1,
            exit: 2,
            distance_m: 4.0,
            eta_secs: 1.6,
        });

        let content = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first["t"], "entry_advisory");
        assert_eq!(second["t"], "exit_advisory");
        assert_eq!(second["exit"], 2);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested_path = dir.path().join("nested").join("dir").join("events.jsonl");
        let file_str = nested_path.to_str().unwrap();

        let egress = Egress::new(file_str);
        let record = LotRecord::Transition { ts: 0, slot: 0, status: "free".to_string() };
        assert!(egress.write_record(&record));
        assert!(nested_path.exists());
    }

    #[test]
    fn test_append_mode_preserves_existing_lines() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("events.jsonl");
        fs::write(&file_path, "{\"existing\":\"data\"}\n").unwrap();

        let egress = Egress::new(file_path.to_str().unwrap());
        egress.write_record(&LotRecord::Transition {
            ts: 0,
            slot: 0,
            status: "free".to_string(),
        });

        let content = fs::read_to_string(&file_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("existing"));
    }
}
