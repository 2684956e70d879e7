//! Pet feeder daemon — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                      │
//! │                                                              │
//! │  SimBoard / HalBoard   LogEventSink   EnvConfig / JsonFile   │
//! │  (Board)               (EventSink)    (ConfigPort)           │
//! │  ScriptedVision (VisionPort)                                 │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │  ControlLoop ─▶ StationManager ─▶ Station × N                │
//! │                  (monitor tasks on one LocalExecutor)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Environment:
//! - `PETFEEDER_CONFIG`: JSON config file; otherwise the `SERVO_<n>_PIN`,
//!   `CAT_FEEDER_<NAME>` … variables are read.
//! - `PETFEEDER_REPLAY`: JSON array of detections to feed the classifier.
//! - `RUST_LOG`: log filter (default `info`).

use core::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use log::{info, warn};

use petfeeder::adapters::config_source::{EnvConfig, JsonFileConfig};
use petfeeder::adapters::log_sink::LogEventSink;
use petfeeder::adapters::sim::{ScriptedVision, SimBoard};
use petfeeder::app::classifier::SubjectClassifier;
use petfeeder::app::control::ControlLoop;
use petfeeder::app::ports::ConfigPort;
use petfeeder::config::FeederConfig;
use petfeeder::feeder::{Executor, StationManager};

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Pet feeder v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let config = load_config()?;

    // ── 3. Shutdown signals ───────────────────────────────────
    let stop = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&stop))
            .with_context(|| format!("registering handler for signal {signal}"))?;
    }

    // ── 4. Run ────────────────────────────────────────────────
    let executor = Executor::new();
    futures_lite::future::block_on(executor.run(run_daemon(&executor, config, stop)))
}

/// The daemon drives `SimBoard` and `ScriptedVision`; no real GPIO.
const SIMULATION_NOTICE: &str =
    "Feeder system running in SIMULATION mode: simulated board, replayed vision, no GPIO";

fn load_config() -> Result<FeederConfig> {
    let config = match std::env::var("PETFEEDER_CONFIG") {
        Ok(path) => JsonFileConfig::new(path).load(),
        Err(_) => EnvConfig::from_process().load(),
    };
    config.context("loading feeder configuration")
}

fn load_vision() -> Result<ScriptedVision> {
    let Ok(path) = std::env::var("PETFEEDER_REPLAY") else {
        warn!("No PETFEEDER_REPLAY set, classifier will see empty frames");
        return Ok(ScriptedVision::new());
    };
    let json = std::fs::read_to_string(&path).with_context(|| format!("reading replay {path}"))?;
    let vision = ScriptedVision::from_json(&json).with_context(|| format!("parsing replay {path}"))?;
    info!("Replaying {} frames from {}", vision.remaining(), path);
    Ok(vision)
}

async fn run_daemon(executor: &Executor, config: FeederConfig, stop: Arc<AtomicBool>) -> Result<()> {
    let sink = Rc::new(RefCell::new(LogEventSink::new()));
    let manager = StationManager::start(executor, SimBoard::new(), &config, sink)
        .context("starting stations")?;

    let classifier = SubjectClassifier::new(load_vision()?, config.confidence_threshold);
    let mut control = ControlLoop::new(&manager, classifier, &config);

    info!("{} (Ctrl+C to stop)", SIMULATION_NOTICE);
    control.run(|| stop.load(Ordering::Relaxed)).await;

    info!("Shutting down feeder system");
    manager.close_all().await;
    info!("System shutdown complete");
    Ok(())
}
