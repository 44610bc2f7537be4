//! Configuration loading from TOML files
//!
//! Config file is selected via the --config command line argument; a missing
//! or unreadable file falls back to defaults with a warning. The occupancy
//! threshold and the distance/speed constants are camera- and scene-specific
//! and must be re-tuned per installation; the defaults match the reference
//! deployment.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default = "default_slots_file")]
    pub slots_file: String,
    #[serde(default = "default_entrances_file")]
    pub entrances_file: String,
    #[serde(default = "default_exits_file")]
    pub exits_file: String,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            slots_file: default_slots_file(),
            entrances_file: default_entrances_file(),
            exits_file: default_exits_file(),
        }
    }
}

fn default_slots_file() -> String {
    "calibration/parking_area_coordinates.txt".to_string()
}

fn default_entrances_file() -> String {
    "calibration/parking_entrance_coordinates.txt".to_string()
}

fn default_exits_file() -> String {
    "calibration/parking_exit_coordinates.txt".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Foreground pixel count at or above which a slot counts as occupied
    #[serde(default = "default_occupied_pixel_threshold")]
    pub occupied_pixel_threshold: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { occupied_pixel_threshold: default_occupied_pixel_threshold() }
    }
}

fn default_occupied_pixel_threshold() -> u32 {
    900
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Producer loop cadence
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Directory of preprocessed mask images replayed as the frame feed
    #[serde(default = "default_masks_dir")]
    pub masks_dir: String,
    /// Restart the mask sequence when it runs out
    #[serde(default)]
    pub loop_replay: bool,
    /// Optional JSONL file of per-frame vehicle detections
    #[serde(default)]
    pub detections_file: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            masks_dir: default_masks_dir(),
            loop_replay: false,
            detections_file: None,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_masks_dir() -> String {
    "frames".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Pixel-to-meter scale of the camera view
    #[serde(default = "default_pixels_per_meter")]
    pub pixels_per_meter: f64,
    /// Assumed vehicle travel speed, meters per second
    #[serde(default = "default_speed_mps")]
    pub speed_mps: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self { pixels_per_meter: default_pixels_per_meter(), speed_mps: default_speed_mps() }
    }
}

fn default_pixels_per_meter() -> f64 {
    40.0
}

fn default_speed_mps() -> f64 {
    2.5
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for transition/advisory egress (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "lot_events.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    slots_file: String,
    entrances_file: String,
    exits_file: String,
    occupied_pixel_threshold: u32,
    poll_interval_ms: u64,
    masks_dir: String,
    loop_replay: bool,
    detections_file: Option<String>,
    pixels_per_meter: f64,
    speed_mps: f64,
    egress_file: String,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: &str) -> Self {
        Self {
            slots_file: toml_config.calibration.slots_file,
            entrances_file: toml_config.calibration.entrances_file,
            exits_file: toml_config.calibration.exits_file,
            occupied_pixel_threshold: toml_config.classifier.occupied_pixel_threshold,
            poll_interval_ms: toml_config.detector.poll_interval_ms,
            masks_dir: toml_config.detector.masks_dir,
            loop_replay: toml_config.detector.loop_replay,
            detections_file: toml_config.detector.detections_file,
            pixels_per_meter: toml_config.routing.pixels_per_meter,
            speed_mps: toml_config.routing.speed_mps,
            egress_file: toml_config.egress.file,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file: config_file.to_string(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, &path.display().to_string()))
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        }
    }

    // Getters for all config fields
    pub fn slots_file(&self) -> &str {
        &self.slots_file
    }

    pub fn entrances_file(&self) -> &str {
        &self.entrances_file
    }

    pub fn exits_file(&self) -> &str {
        &self.exits_file
    }

    pub fn occupied_pixel_threshold(&self) -> u32 {
        self.occupied_pixel_threshold
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    pub fn masks_dir(&self) -> &str {
        &self.masks_dir
    }

    pub fn loop_replay(&self) -> bool {
        self.loop_replay
    }

    pub fn detections_file(&self) -> Option<&str> {
        self.detections_file.as_deref()
    }

    pub fn pixels_per_meter(&self) -> f64 {
        self.pixels_per_meter
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.slots_file(), "calibration/parking_area_coordinates.txt");
        assert_eq!(config.entrances_file(), "calibration/parking_entrance_coordinates.txt");
        assert_eq!(config.exits_file(), "calibration/parking_exit_coordinates.txt");
        assert_eq!(config.occupied_pixel_threshold(), 900);
        assert_eq!(config.poll_interval_ms(), 500);
        assert_eq!(config.pixels_per_meter(), 40.0);
        assert_eq!(config.speed_mps(), 2.5);
        assert_eq!(config.metrics_interval_secs(), 10);
        assert!(!config.loop_replay());
        assert!(config.detections_file().is_none());
    }

    #[test]
    fn test_egress_file_default() {
        let egress = EgressConfig::default();
        assert_eq!(egress.file, "lot_events.jsonl");
        assert!(!egress.file.is_empty());

        let config = Config::default();
        assert_eq!(config.egress_file(), "lot_events.jsonl");
    }

    #[test]
    fn test_empty_toml_uses_section_defaults() {
        let toml_config: TomlConfig = toml::from_str("").unwrap();
        let config = Config::from_toml(toml_config, "empty");
        assert_eq!(config.occupied_pixel_threshold(), 900);
        assert_eq!(config.poll_interval_ms(), 500);
        assert_eq!(config.config_file(), "empty");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
[classifier]
occupied_pixel_threshold = 450
"#,
        )
        .unwrap();
        let config = Config::from_toml(toml_config, "partial");
        assert_eq!(config.occupied_pixel_threshold(), 450);
        assert_eq!(config.pixels_per_meter(), 40.0);
    }
}
