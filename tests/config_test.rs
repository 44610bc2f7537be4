//! Integration tests for configuration loading

use lot_monitor::infra::Config;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[calibration]
slots_file = "lot/slots.txt"
entrances_file = "lot/in.txt"
exits_file = "lot/out.txt"

[classifier]
occupied_pixel_threshold = 1200

[detector]
poll_interval_ms = 250
masks_dir = "masks"
loop_replay = true
detections_file = "boxes.jsonl"

[routing]
pixels_per_meter = 55.0
speed_mps = 3.0

[egress]
file = "out/events.jsonl"

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.slots_file(), "lot/slots.txt");
    assert_eq!(config.entrances_file(), "lot/in.txt");
    assert_eq!(config.exits_file(), "lot/out.txt");
    assert_eq!(config.occupied_pixel_threshold(), 1200);
    assert_eq!(config.poll_interval_ms(), 250);
    assert_eq!(config.masks_dir(), "masks");
    assert!(config.loop_replay());
    assert_eq!(config.detections_file(), Some("boxes.jsonl"));
    assert_eq!(config.pixels_per_meter(), 55.0);
    assert_eq!(config.speed_mps(), 3.0);
    assert_eq!(config.egress_file(), "out/events.jsonl");
    assert_eq!(config.metrics_interval_secs(), 15);
}

#[test]
fn test_omitted_sections_fall_back_to_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[detector]\npoll_interval_ms = 100\n")
        .unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.poll_interval_ms(), 100);
    assert_eq!(config.occupied_pixel_threshold(), 900);
    assert_eq!(config.pixels_per_meter(), 40.0);
    assert_eq!(config.speed_mps(), 2.5);
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.slots_file(), "calibration/parking_area_coordinates.txt");
    assert_eq!(config.occupied_pixel_threshold(), 900);
    assert_eq!(config.poll_interval_ms(), 500);
}

#[test]
fn test_unparseable_config_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"not valid toml [").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}
