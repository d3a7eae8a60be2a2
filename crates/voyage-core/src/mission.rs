//! Mission assembly and sequencing.
//!
//! [`build_mission`] validates a phase list and entry state into a
//! [`MissionSequencer`]; [`MissionSequencer::run`] drives the phases in
//! order, carrying the mutated state vector across phase boundaries, and
//! resolves to a [`MissionOutcome`].
//!
//! A sequencer drives exactly one run: `run` consumes it, there is no
//! retry path, and the state vector is never shared between concurrent
//! runs. Cancellation is not a failure -- an interrupted phase resolves
//! the mission to `Aborted` with a fully valid partial state.

use tracing::{info, warn};

use voyage_types::{MissionOutcome, MissionStatus, PhaseStatus, StateVector};

use crate::observer::Observer;
use crate::perturbation::PerturbationSource;
use crate::phase::PhaseDefinition;
use crate::runner::{self, CancelFlag, PhaseError, RunnerBounds};
use crate::state::{self, StateError};

/// Errors detected at mission-assembly time, before any tick executes.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The phase list is empty.
    #[error("mission has no phases")]
    EmptyPhaseList,

    /// A phase's declared halt fields cannot be influenced by its
    /// declared driven fields, so its predicate can never turn false.
    #[error("phase {index} ('{name}') can never satisfy its continuation predicate")]
    UnsatisfiablePhase {
        /// Position of the phase in the mission.
        index: usize,
        /// Name of the phase.
        name: String,
    },

    /// The entry state is already invalid.
    #[error("invalid entry state: {source}")]
    InvalidEntryState {
        /// The underlying validation failure.
        #[from]
        source: StateError,
    },
}

/// Errors that can occur during a mission run.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    /// A phase execution failed.
    #[error("phase error: {source}")]
    Phase {
        /// The underlying phase error.
        #[from]
        source: PhaseError,
    },
}

/// Orders a list of phases and carries one state vector through them.
///
/// Created with [`build_mission`]; destroyed when the mission resolves
/// (`run` consumes `self`).
#[derive(Debug)]
pub struct MissionSequencer {
    /// The ordered phase list.
    phases: Vec<PhaseDefinition>,
    /// Index of the phase currently (or most recently) running.
    current_index: usize,
    /// Overall status; terminal once `run` returns.
    outcome: MissionStatus,
    /// The mission's physical state, exclusively owned for the run.
    state: StateVector,
    /// Safety bounds applied to every phase.
    bounds: RunnerBounds,
}

/// Validate a phase list and entry state into a sequencer.
///
/// Static validation is best-effort, not exhaustive: only phases that
/// declare their driven/halt fields are checked for a satisfiable
/// predicate (see [`PhaseDefinition::can_terminate`]).
///
/// # Errors
///
/// Returns [`BuildError`] if the phase list is empty, a declared phase
/// cannot terminate, or the entry state fails validation.
pub fn build_mission(
    phases: Vec<PhaseDefinition>,
    entry_state: StateVector,
) -> Result<MissionSequencer, BuildError> {
    if phases.is_empty() {
        return Err(BuildError::EmptyPhaseList);
    }

    for (index, phase) in phases.iter().enumerate() {
        if !phase.can_terminate() {
            return Err(BuildError::UnsatisfiablePhase {
                index,
                name: phase.name().to_owned(),
            });
        }
    }

    state::ensure_finite(&entry_state)?;

    Ok(MissionSequencer {
        phases,
        current_index: 0,
        outcome: MissionStatus::InProgress,
        state: entry_state,
        bounds: RunnerBounds::UNLIMITED,
    })
}

impl MissionSequencer {
    /// Replace the runner bounds applied to every phase.
    #[must_use]
    pub fn with_bounds(mut self, bounds: RunnerBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// The overall mission status.
    pub const fn outcome(&self) -> MissionStatus {
        self.outcome
    }

    /// Index of the phase currently (or most recently) running.
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Read-only view of the mission state.
    pub const fn state(&self) -> &StateVector {
        &self.state
    }

    /// The ordered phase list.
    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    /// Run the mission to resolution.
    ///
    /// Synchronous: returns only once the mission is `Completed` or
    /// `Aborted`, driving `observer` on every tick in between. The
    /// mutated state of each completed phase is the entry state of the
    /// next. A phase reaching `Interrupted` stops the run immediately
    /// with the partial state and the index of the interrupted phase.
    ///
    /// # Errors
    ///
    /// Returns [`MissionError`] if a phase fails with an invalid state,
    /// a tick overflow, or an exhausted tick bound. Cancellation is not
    /// an error.
    pub fn run(
        mut self,
        source: &mut dyn PerturbationSource,
        observer: &mut dyn Observer,
        cancel: &CancelFlag,
    ) -> Result<MissionOutcome, MissionError> {
        info!(phases = self.phases.len(), "Mission starting");

        for (index, phase) in self.phases.iter().enumerate() {
            self.current_index = index;

            let status = runner::run_phase(
                phase,
                &mut self.state,
                source,
                observer,
                cancel,
                self.bounds,
            )?;

            if status == PhaseStatus::Interrupted {
                self.outcome = MissionStatus::Aborted;
                warn!(
                    phase = phase.name(),
                    phase_index = index,
                    "Mission aborted"
                );
                return Ok(MissionOutcome {
                    status: MissionStatus::Aborted,
                    final_state: self.state,
                    phase_index_at_stop: index,
                });
            }
        }

        self.outcome = MissionStatus::Completed;
        let last_index = self.phases.len().saturating_sub(1);
        info!(phases = self.phases.len(), "Mission completed");
        Ok(MissionOutcome {
            status: MissionStatus::Completed,
            final_state: self.state,
            phase_index_at_stop: last_index,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use voyage_types::StateField;

    use super::*;
    use crate::observer::RecordingObserver;
    use crate::perturbation::{PerturbationKind, SequenceSource};

    /// A phase that applies fixed structural stress per tick until the
    /// integrity target is reached.
    fn stress_phase(target: f64) -> PhaseDefinition {
        PhaseDefinition::new(
            "stress-test",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.integrity -= 10.0;
                next
            },
            move |state| state.integrity > target,
        )
        .with_fields(&[StateField::Integrity], &[StateField::Integrity])
    }

    /// A phase that drains resource until empty.
    fn drain_phase() -> PhaseDefinition {
        PhaseDefinition::new(
            "drain",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.resource_level -= 25.0;
                next
            },
            |state| state.resource_level > 0.0,
        )
        .with_fields(&[StateField::ResourceLevel], &[StateField::ResourceLevel])
    }

    #[test]
    fn empty_phase_list_is_rejected() {
        let result = build_mission(Vec::new(), StateVector::default());
        assert!(matches!(result, Err(BuildError::EmptyPhaseList)));
    }

    #[test]
    fn unsatisfiable_phase_is_rejected_with_its_index() {
        let good = stress_phase(40.0);
        let bad = stress_phase(40.0)
            .with_fields(&[StateField::Temperature], &[StateField::Velocity]);

        let result = build_mission(vec![good, bad], StateVector::default());
        assert!(matches!(
            result,
            Err(BuildError::UnsatisfiablePhase { index: 1, .. })
        ));
    }

    #[test]
    fn non_finite_entry_state_is_rejected() {
        let mut entry = StateVector::default();
        entry.altitude = f64::NAN;
        let result = build_mission(vec![stress_phase(40.0)], entry);
        assert!(matches!(result, Err(BuildError::InvalidEntryState { .. })));
    }

    #[test]
    fn state_carries_across_phase_boundaries() {
        let mut entry = StateVector::with_capacity(100.0);
        entry.resource_level = 100.0;

        let mission = build_mission(vec![stress_phase(40.0), drain_phase()], entry).unwrap();
        let mut source = SequenceSource::constant(0.0);
        let mut observer = RecordingObserver::new();
        let outcome = mission
            .run(&mut source, &mut observer, &CancelFlag::new())
            .unwrap();

        assert_eq!(outcome.status, MissionStatus::Completed);
        assert_eq!(outcome.phase_index_at_stop, 1);
        // Phase 1 ground integrity down to 40; phase 2 left it alone.
        assert_eq!(outcome.final_state.integrity, 40.0);
        assert_eq!(outcome.final_state.resource_level, 0.0);
    }

    #[test]
    fn interruption_reports_the_stopped_phase_index() {
        let mut entry = StateVector::with_capacity(100.0);
        entry.resource_level = 100.0;

        let mission = build_mission(vec![stress_phase(40.0), drain_phase()], entry).unwrap();
        let cancel = CancelFlag::new();

        /// Cancels as soon as the named phase starts.
        struct CancelOnPhase {
            flag: CancelFlag,
            phase_name: String,
        }

        impl Observer for CancelOnPhase {
            fn observe(&mut self, observation: &voyage_types::Observation) {
                if observation.phase_name == self.phase_name {
                    self.flag.request();
                }
            }
        }

        let mut observer = CancelOnPhase {
            flag: cancel.clone(),
            phase_name: "drain".to_owned(),
        };
        let mut source = SequenceSource::constant(0.0);
        let outcome = mission.run(&mut source, &mut observer, &cancel).unwrap();

        assert_eq!(outcome.status, MissionStatus::Aborted);
        assert_eq!(outcome.phase_index_at_stop, 1);
        // Phase 1 finished intact; phase 2 was cut short mid-way.
        assert_eq!(outcome.final_state.integrity, 40.0);
        assert!(outcome.final_state.resource_level > 0.0);
    }

    #[test]
    fn phase_error_propagates_as_mission_error() {
        let broken = PhaseDefinition::new(
            "broken",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.temperature = f64::INFINITY;
                next
            },
            |state| state.temperature < 10_000.0,
        );

        let mission = build_mission(vec![broken], StateVector::default()).unwrap();
        let mut source = SequenceSource::constant(0.0);
        let mut observer = RecordingObserver::new();
        let result = mission.run(&mut source, &mut observer, &CancelFlag::new());

        assert!(matches!(result, Err(MissionError::Phase { .. })));
    }
}
