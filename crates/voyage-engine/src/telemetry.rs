//! Telemetry observer: the presentation layer over the engine's
//! observation stream.
//!
//! The engine core never renders, sleeps, or logs a status line; this
//! observer does all three on its behalf. Every tick is logged at debug
//! level, a status line lands every few cycles at info level, and phase
//! transitions and interlocks are always surfaced. Pacing happens here
//! too: the tick boundary is the only legal point to slow a run down,
//! so the observer sleeps each phase's nominal tick interval after the
//! tick's record arrives.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use voyage_core::observer::Observer;
use voyage_types::{EventTag, Observation};

/// How many ticks between info-level status lines.
const STATUS_EVERY_TICKS: u64 = 15;

/// Observer that logs the mission via `tracing` and paces the run.
#[derive(Debug)]
pub struct TelemetryObserver {
    /// Per-phase nominal tick intervals, keyed by phase name.
    pacing: BTreeMap<String, Duration>,
    /// Global override; when set it replaces every phase's own interval.
    override_interval: Option<Duration>,
}

impl TelemetryObserver {
    /// Create a telemetry observer from the mission's pacing contracts
    /// and an optional global override.
    pub const fn new(
        pacing: BTreeMap<String, Duration>,
        override_interval: Option<Duration>,
    ) -> Self {
        Self {
            pacing,
            override_interval,
        }
    }

    /// Sleep the configured interval for the given phase, if any.
    fn pace(&self, phase_name: &str) {
        let interval = self
            .override_interval
            .or_else(|| self.pacing.get(phase_name).copied())
            .unwrap_or_default();
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
}

impl Observer for TelemetryObserver {
    fn observe(&mut self, observation: &Observation) {
        let state = &observation.state;
        match observation.event {
            EventTag::PhaseStarted => {
                info!(
                    phase = %observation.phase_name,
                    velocity = state.velocity,
                    altitude = state.altitude,
                    resource_level = state.resource_level,
                    integrity = state.integrity,
                    "Phase started"
                );
            }
            EventTag::Tick => {
                debug!(
                    phase = %observation.phase_name,
                    tick = observation.tick,
                    velocity = state.velocity,
                    position = state.position,
                    altitude = state.altitude,
                    resource_level = state.resource_level,
                    temperature = state.temperature,
                    integrity = state.integrity,
                    "Tick"
                );
                if observation.tick.checked_rem(STATUS_EVERY_TICKS) == Some(0) {
                    info!(
                        phase = %observation.phase_name,
                        tick = observation.tick,
                        velocity = state.velocity,
                        altitude = state.altitude,
                        resource_level = state.resource_level,
                        "Status"
                    );
                }
                self.pace(&observation.phase_name);
            }
            EventTag::Interlock => {
                warn!(
                    phase = %observation.phase_name,
                    tick = observation.tick,
                    temperature = state.temperature,
                    integrity = state.integrity,
                    "Interlock engaged"
                );
            }
            EventTag::PhaseCompleted => {
                info!(
                    phase = %observation.phase_name,
                    ticks = observation.tick,
                    velocity = state.velocity,
                    altitude = state.altitude,
                    resource_level = state.resource_level,
                    "Phase completed"
                );
            }
            EventTag::PhaseInterrupted => {
                warn!(
                    phase = %observation.phase_name,
                    tick = observation.tick,
                    "Phase interrupted"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use voyage_types::StateVector;

    use super::*;

    #[test]
    fn unknown_phase_paces_without_sleeping() {
        let observer = TelemetryObserver::new(BTreeMap::new(), None);
        // No interval registered: must return immediately.
        observer.pace("unregistered-phase");
    }

    #[test]
    fn observer_accepts_every_event_tag() {
        let mut observer = TelemetryObserver::new(BTreeMap::new(), None);
        let state = StateVector::default();
        for event in [
            EventTag::PhaseStarted,
            EventTag::Tick,
            EventTag::Interlock,
            EventTag::PhaseCompleted,
            EventTag::PhaseInterrupted,
        ] {
            observer.observe(&Observation::new("check", &state, event));
        }
    }
}
