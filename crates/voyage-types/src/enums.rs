//! Enumeration types for the Voyage simulation engine.
//!
//! Status enums for phases and missions, the event tags carried by
//! observation records, and the state-field identifiers used for
//! validation and diagnostics.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Phase lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a single mission phase.
///
/// A phase moves `Pending -> Running -> {Completed, Interrupted}`. The two
/// terminal states are final for that phase: the sequencer either advances
/// (`Completed`) or aborts the mission (`Interrupted`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseStatus {
    /// The phase has not started yet.
    Pending,
    /// The phase is ticking.
    Running,
    /// The continuation predicate turned false; the phase is done.
    Completed,
    /// A cancellation request landed at a tick boundary.
    Interrupted,
}

impl PhaseStatus {
    /// Returns `true` if this status is terminal for the phase.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Interrupted)
    }
}

// ---------------------------------------------------------------------------
// Mission lifecycle
// ---------------------------------------------------------------------------

/// Overall outcome status of a mission run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionStatus {
    /// The mission is still running.
    InProgress,
    /// Every phase completed in order.
    Completed,
    /// A phase was interrupted; the mission stopped with partial state.
    Aborted,
}

// ---------------------------------------------------------------------------
// Observation event tags
// ---------------------------------------------------------------------------

/// What an [`Observation`] record describes.
///
/// Within a phase the emission order is: one `PhaseStarted`, then per tick
/// an optional `Interlock` followed by exactly one `Tick`, then exactly one
/// `PhaseCompleted` or `PhaseInterrupted`. A phase whose continuation
/// predicate is already false at entry emits only `PhaseCompleted`.
///
/// [`Observation`]: crate::structs::Observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTag {
    /// The phase entered its tick loop (after the entry hook, before tick 1).
    PhaseStarted,
    /// One tick's update was applied and committed.
    Tick,
    /// A safety interlock fired; emitted before the same tick's `Tick` event.
    Interlock,
    /// The phase completed; emitted immediately after the final tick event.
    PhaseCompleted,
    /// The phase was cancelled at a tick boundary.
    PhaseInterrupted,
}

// ---------------------------------------------------------------------------
// State fields
// ---------------------------------------------------------------------------

/// Identifies one field of the [`StateVector`].
///
/// Used by phase definitions to declare which fields their update rule
/// drives and which fields their continuation predicate watches (for
/// best-effort static validation at mission-build time), and by state
/// validation errors to name the offending field.
///
/// [`StateVector`]: crate::structs::StateVector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateField {
    /// Current velocity (km/h).
    Velocity,
    /// Distance traveled or remaining (km).
    Position,
    /// Altitude above the reference surface (unit is phase-dependent).
    Altitude,
    /// Fuel or harvested quantity, bounded `[0, capacity]`.
    ResourceLevel,
    /// The `resource_level` ceiling.
    Capacity,
    /// Hull or structural temperature (degrees C).
    Temperature,
    /// Structural health, bounded `[0, 100]`.
    Integrity,
    /// The per-phase tick counter.
    Tick,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_and_interrupted_are_terminal() {
        assert!(PhaseStatus::Completed.is_terminal());
        assert!(PhaseStatus::Interrupted.is_terminal());
        assert!(!PhaseStatus::Pending.is_terminal());
        assert!(!PhaseStatus::Running.is_terminal());
    }
}
