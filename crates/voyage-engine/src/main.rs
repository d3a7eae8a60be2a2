//! Mission driver binary for the Voyage simulation engine.
//!
//! This is the thin driver over the engine library: it loads
//! configuration, assembles the configured mission from the phase
//! catalog, wires Ctrl-C into the engine's cancellation flag, runs the
//! mission with a telemetry observer, and reports the outcome.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `voyage-config.yaml` (or `VOYAGE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Assemble the mission from the profile catalog
//! 4. Wire Ctrl-C to the cancellation flag
//! 5. Run the mission on a blocking thread (the engine is synchronous)
//! 6. Report the outcome and final state

mod error;
mod telemetry;

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use voyage_core::config::EngineConfig;
use voyage_core::mission::build_mission;
use voyage_core::perturbation::{PerturbationSource, SeededSource, ThreadRngSource};
use voyage_core::profiles;
use voyage_core::runner::CancelFlag;
use voyage_types::MissionStatus;

use crate::error::EngineError;
use crate::telemetry::TelemetryObserver;

/// Load configuration from the conventional path, falling back to
/// defaults when no file exists.
///
/// The path is `voyage-config.yaml` in the working directory unless the
/// `VOYAGE_CONFIG` environment variable overrides it.
///
/// # Errors
///
/// Returns [`EngineError::Config`] if a file exists but cannot be read
/// or parsed.
fn load_config() -> Result<EngineConfig, EngineError> {
    let path =
        std::env::var("VOYAGE_CONFIG").unwrap_or_else(|_| String::from("voyage-config.yaml"));
    let path = Path::new(&path);
    if path.exists() {
        Ok(EngineConfig::from_file(path)?)
    } else {
        Ok(EngineConfig::default())
    }
}

/// Application entry point for the mission driver.
///
/// Initializes all subsystems and runs the configured mission. The
/// async runtime exists only for signal wiring and to host the blocking
/// run; the engine itself is synchronous.
///
/// # Errors
///
/// Returns an error if any initialization step or the mission itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration (it carries the default log filter).
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(
        run_id = %run_id,
        profile = %config.mission.profile,
        seed = config.run.seed,
        tick_interval_ms = config.run.tick_interval_ms,
        max_ticks_per_phase = config.bounds.max_ticks_per_phase,
        "voyage-engine starting"
    );

    // 3. Assemble the mission.
    let (phases, entry_state) =
        profiles::mission_by_name(&config.mission.profile).ok_or_else(|| {
            EngineError::UnknownMission {
                name: config.mission.profile.clone(),
            }
        })?;

    // Capture each phase's pacing contract before the sequencer takes
    // ownership of the phase list.
    let pacing: BTreeMap<String, Duration> = phases
        .iter()
        .map(|phase| (phase.name().to_owned(), phase.tick_interval()))
        .collect();
    let override_interval = if config.run.tick_interval_ms > 0 {
        Some(Duration::from_millis(config.run.tick_interval_ms))
    } else {
        None
    };

    let mission = build_mission(phases, entry_state)
        .map_err(EngineError::from)?
        .with_bounds(config.bounds.runner_bounds());
    info!(phases = mission.phases().len(), "Mission assembled");

    // 4. Wire Ctrl-C to the cancellation flag.
    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received; cancelling at the next tick boundary");
            signal_flag.request();
        }
    });

    // 5. Run the mission on a blocking thread.
    let seed = config.run.seed;
    let run_result = tokio::task::spawn_blocking(move || {
        let mut observer = TelemetryObserver::new(pacing, override_interval);
        if seed == 0 {
            let mut source = ThreadRngSource::new();
            run_mission(mission, &mut source, &mut observer, &cancel)
        } else {
            let mut source = SeededSource::new(seed);
            run_mission(mission, &mut source, &mut observer, &cancel)
        }
    })
    .await
    .map_err(|join_error| EngineError::Runtime {
        message: join_error.to_string(),
    })?;
    let outcome = run_result.map_err(EngineError::from)?;

    // 6. Report the outcome.
    let elapsed_ms = Utc::now()
        .signed_duration_since(started_at)
        .num_milliseconds();
    match outcome.status {
        MissionStatus::Completed => info!(
            run_id = %run_id,
            phase_index = outcome.phase_index_at_stop,
            elapsed_ms,
            "Mission completed"
        ),
        MissionStatus::Aborted => warn!(
            run_id = %run_id,
            phase_index = outcome.phase_index_at_stop,
            elapsed_ms,
            "Mission aborted with partial state"
        ),
        MissionStatus::InProgress => warn!(run_id = %run_id, "Mission did not resolve"),
    }

    let final_state = outcome.final_state;
    info!(
        velocity = final_state.velocity,
        position = final_state.position,
        altitude = final_state.altitude,
        resource_level = final_state.resource_level,
        temperature = final_state.temperature,
        integrity = final_state.integrity,
        "Final state"
    );

    Ok(())
}

/// Drive a sequencer to resolution with the given source and observer.
fn run_mission(
    mission: voyage_core::mission::MissionSequencer,
    source: &mut dyn PerturbationSource,
    observer: &mut TelemetryObserver,
    cancel: &CancelFlag,
) -> Result<voyage_types::MissionOutcome, voyage_core::mission::MissionError> {
    mission.run(source, observer, cancel)
}
