//! Lot monitor - parking occupancy tracking and routing advisories
//!
//! Classifies per-slot occupancy from preprocessed foreground masks, tracks
//! state-change times, and produces nearest-slot / nearest-exit advisories.
//!
//! Module structure:
//! - `domain/` - Core business types (geometry, slots, gates, reports)
//! - `io/` - External interfaces (calibration files, frame/vehicle feeds, egress)
//! - `services/` - Business logic (Classifier, Tracker, Router, Detector)
//! - `infra/` - Infrastructure (Config, Metrics)

use anyhow::Context;
use clap::Parser;
use lot_monitor::infra::{Config, Metrics};
use lot_monitor::io::calibration::LotLayout;
use lot_monitor::io::egress::Egress;
use lot_monitor::io::frames::{FrameSource, MaskSequence};
use lot_monitor::io::vehicles::{DetectionFeed, NoDetections, VehicleSource};
use lot_monitor::services::classifier::OccupancyClassifier;
use lot_monitor::services::detector::Detector;
use lot_monitor::services::router::{Router, RoutingParams};
use lot_monitor::services::tracker::SlotTracker;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Lot monitor - parking occupancy and routing service
#[derive(Parser, Debug)]
#[command(name = "lot-monitor", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for per-cycle visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("lot-monitor starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        slots_file = %config.slots_file(),
        entrances_file = %config.entrances_file(),
        exits_file = %config.exits_file(),
        occupied_pixel_threshold = %config.occupied_pixel_threshold(),
        poll_interval_ms = %config.poll_interval_ms(),
        masks_dir = %config.masks_dir(),
        pixels_per_meter = %config.pixels_per_meter(),
        speed_mps = %config.speed_mps(),
        egress_file = %config.egress_file(),
        "config_loaded"
    );

    // The slot list must exist; gate files may be absent (no routing then)
    let layout = Arc::new(
        LotLayout::load(
            Path::new(config.slots_file()),
            Path::new(config.entrances_file()),
            Path::new(config.exits_file()),
        )
        .context("failed to load calibration")?,
    );

    let tracker = Arc::new(SlotTracker::new(layout.slots.iter().map(|s| s.id).collect()));
    let metrics = Arc::new(Metrics::new());
    let classifier = OccupancyClassifier::new(config.occupied_pixel_threshold());
    let router = Router::new(RoutingParams {
        pixels_per_meter: config.pixels_per_meter(),
        speed_mps: config.speed_mps(),
    });
    let egress = Egress::new(config.egress_file());

    let frames: Box<dyn FrameSource> =
        Box::new(MaskSequence::from_dir(Path::new(config.masks_dir()), config.loop_replay())
            .with_context(|| format!("failed to open masks dir {}", config.masks_dir()))?);

    let vehicles: Box<dyn VehicleSource> = match config.detections_file() {
        Some(path) => Box::new(
            DetectionFeed::from_file(Path::new(path))
                .with_context(|| format!("failed to open detections file {}", path))?,
        ),
        None => Box::new(NoDetections),
    };

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start metrics reporter
    let metrics_clone = metrics.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            metrics_clone.report().log();
        }
    });

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run detector - the producer loop, until shutdown
    let detector = Detector::new(
        frames,
        vehicles,
        classifier,
        router,
        tracker.clone(),
        layout,
        egress,
        metrics,
        config.poll_interval_ms(),
    );
    info!(slots = %tracker.slot_count(), "detector_started");
    detector.run(shutdown_rx).await;

    // Last committed state stays queryable through shutdown
    let report = tracker.status();
    info!(
        generation = %report.generation,
        free = %report.free_ids().len(),
        total = %report.slot_ids.len(),
        "final_status"
    );

    info!("lot-monitor shutdown complete");
    Ok(())
}
