//! Core data structs for the Voyage simulation engine.
//!
//! Covers the physical [`StateVector`] mutated by phase updates, the
//! [`Observation`] records emitted to consumers, and the [`MissionOutcome`]
//! returned when a run resolves.

use serde::{Deserialize, Serialize};

use crate::enums::{EventTag, MissionStatus};

// ---------------------------------------------------------------------------
// StateVector
// ---------------------------------------------------------------------------

/// The mutable physical state of a mission.
///
/// Exactly one sequencer owns a `StateVector` for the duration of a run;
/// consumers only ever see read-only snapshots inside [`Observation`]
/// records. The bounded fields (`resource_level`, `integrity`) are clamped
/// to their domain on every committed mutation, and a tick's update is
/// committed only after clamping and finite-validation succeed, so a
/// partially applied tick is never observable.
///
/// Units: km/h for velocity, km for position, phase-dependent meters or
/// km for altitude, degrees C for temperature, percent for integrity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Current velocity (km/h).
    pub velocity: f64,
    /// Distance traveled or remaining (km).
    pub position: f64,
    /// Altitude above the reference surface (meters or km, phase-dependent).
    pub altitude: f64,
    /// Fuel or harvested quantity, bounded `[0, capacity]`.
    pub resource_level: f64,
    /// The `resource_level` ceiling. Must be positive and finite.
    pub capacity: f64,
    /// Hull or structural temperature (degrees C).
    pub temperature: f64,
    /// Structural health, bounded `[0, 100]`.
    pub integrity: f64,
    /// Step counter within the current phase. Resets to 0 at phase entry
    /// and increases by exactly 1 per committed tick.
    pub tick: u64,
}

impl StateVector {
    /// The upper bound of the `integrity` field.
    pub const MAX_INTEGRITY: f64 = 100.0;

    /// Create a zeroed state vector with the given resource capacity and
    /// full structural integrity.
    pub const fn with_capacity(capacity: f64) -> Self {
        Self {
            velocity: 0.0,
            position: 0.0,
            altitude: 0.0,
            resource_level: 0.0,
            capacity,
            temperature: 0.0,
            integrity: Self::MAX_INTEGRITY,
            tick: 0,
        }
    }
}

impl Default for StateVector {
    /// A zeroed state with a capacity of 100 (percent-scale resource).
    fn default() -> Self {
        Self::with_capacity(100.0)
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// An immutable record describing the state and context at one tick or
/// phase transition.
///
/// The sequencer emits observations in strict tick order, once per tick,
/// with no reordering or batching. The record carries no wall-clock
/// timestamp: two runs with the same phase list and perturbation sequence
/// produce identical observation sequences, which is what deterministic
/// replay tests compare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Name of the phase that produced this record.
    pub phase_name: String,
    /// The per-phase tick counter at emission time (0 for entry events).
    pub tick: u64,
    /// Read-only snapshot of the state after the event.
    pub state: StateVector,
    /// What this record describes.
    pub event: EventTag,
}

impl Observation {
    /// Create an observation snapshotting the given state.
    pub fn new(phase_name: &str, state: &StateVector, event: EventTag) -> Self {
        Self {
            phase_name: phase_name.to_owned(),
            tick: state.tick,
            state: *state,
            event,
        }
    }
}

// ---------------------------------------------------------------------------
// MissionOutcome
// ---------------------------------------------------------------------------

/// The result of a resolved mission run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionOutcome {
    /// `Completed` if every phase finished, `Aborted` on interruption.
    pub status: MissionStatus,
    /// The state as of the last committed tick.
    pub final_state: StateVector,
    /// Index of the phase that was running (or had just completed) when
    /// the mission resolved.
    pub phase_index_at_stop: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn with_capacity_starts_zeroed_and_intact() {
        let state = StateVector::with_capacity(250.0);
        assert_eq!(state.velocity, 0.0);
        assert_eq!(state.resource_level, 0.0);
        assert_eq!(state.capacity, 250.0);
        assert_eq!(state.integrity, StateVector::MAX_INTEGRITY);
        assert_eq!(state.tick, 0);
    }

    #[test]
    fn observation_snapshots_state_by_value() {
        let mut state = StateVector::default();
        state.velocity = 14_000.0;
        state.tick = 77;

        let observation = Observation::new("deceleration-burn", &state, EventTag::Tick);

        // Later mutation of the live state must not leak into the record.
        state.velocity = 0.0;
        assert_eq!(observation.state.velocity, 14_000.0);
        assert_eq!(observation.tick, 77);
    }

    #[test]
    fn observation_serializes_as_plain_data() {
        let observation =
            Observation::new("surface-harvest", &StateVector::default(), EventTag::PhaseCompleted);
        let json = serde_json::to_string(&observation).unwrap();
        let back: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, observation);
    }
}
