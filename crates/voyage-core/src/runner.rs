//! The single-phase tick loop.
//!
//! [`run_phase`] drives one [`PhaseDefinition`] to a terminal status:
//!
//! 1. Reset the tick counter; if the continuation predicate is already
//!    false, complete after zero ticks with the unmodified entry state.
//! 2. Run the entry hook once and emit a `PhaseStarted` observation.
//! 3. Per tick: poll cancellation, check the tick bound, sample the
//!    perturbation, apply the update, clamp and validate, commit, fire
//!    the interlock (emitting its observation before the regular tick
//!    observation), emit the tick observation, and re-evaluate the
//!    predicate.
//!
//! Ticks are atomic units of work: a cancellation request lands at the
//! next tick boundary and never mid-tick, so the interrupted state is
//! always the state as of the last completed tick. The loop itself never
//! sleeps -- pacing belongs to the observer at the tick boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use voyage_types::{EventTag, Observation, PhaseStatus, StateVector};

use crate::observer::Observer;
use crate::perturbation::PerturbationSource;
use crate::phase::PhaseDefinition;
use crate::state::{self, StateError};

/// Errors that can occur while running a phase.
#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    /// An update rule or hook produced an invalid state. Fatal to the
    /// run; indicates a bug in the phase definition.
    #[error("invalid state in phase '{phase}': {source}")]
    InvalidState {
        /// Name of the offending phase.
        phase: String,
        /// The underlying validation failure.
        source: StateError,
    },

    /// The phase exceeded the configured tick bound without completing.
    #[error("phase '{phase}' exceeded {limit} ticks without completing")]
    TickLimitExceeded {
        /// Name of the runaway phase.
        phase: String,
        /// The configured bound.
        limit: u64,
    },

    /// The tick counter would overflow.
    #[error("tick counter overflow in phase '{phase}'")]
    TickOverflow {
        /// Name of the phase.
        phase: String,
    },
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cloneable cancellation handle polled at tick boundaries.
///
/// Any holder may call [`request`]; the active phase observes the request
/// between ticks, transitions to `Interrupted`, and the mission aborts
/// with a fully valid partial state. A request has no effect once a
/// tick's update has begun.
///
/// [`request`]: CancelFlag::request
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    requested: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Create a flag with no pending request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation at the next tick boundary.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Safety bounds applied to every phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunnerBounds {
    /// Maximum ticks a single phase may run (0 = unlimited). Exceeding
    /// the bound is an error: a phase that cannot terminate indicates a
    /// malformed update/predicate pair that static validation could not
    /// catch.
    pub max_ticks_per_phase: u64,
}

impl RunnerBounds {
    /// No bounds; phases run until their predicate turns false.
    pub const UNLIMITED: Self = Self {
        max_ticks_per_phase: 0,
    };

    /// Create bounds with the given per-phase tick limit (0 = unlimited).
    pub const fn new(max_ticks_per_phase: u64) -> Self {
        Self { max_ticks_per_phase }
    }

    /// Whether a phase at the given tick count has hit the limit.
    pub const fn tick_limit_reached(self, tick: u64) -> bool {
        self.max_ticks_per_phase > 0 && tick >= self.max_ticks_per_phase
    }
}

// ---------------------------------------------------------------------------
// run_phase
// ---------------------------------------------------------------------------

/// Clamp and validate a state in phase context.
fn settle(phase: &PhaseDefinition, state: &mut StateVector) -> Result<(), PhaseError> {
    state::clamp(state);
    state::ensure_finite(state).map_err(|source| PhaseError::InvalidState {
        phase: phase.name().to_owned(),
        source,
    })
}

/// Drive one phase from entry to a terminal status.
///
/// Mutates `state` in place, consuming perturbation samples from
/// `source` and reporting every tick and transition to `observer`.
/// Returns [`PhaseStatus::Completed`] when the continuation predicate
/// turns false, or [`PhaseStatus::Interrupted`] when a cancellation
/// request is observed at a tick boundary.
///
/// # Errors
///
/// Returns [`PhaseError`] if the update rule or a hook produces an
/// invalid state, if the tick counter overflows, or if the phase exceeds
/// `bounds`.
pub fn run_phase(
    phase: &PhaseDefinition,
    state: &mut StateVector,
    source: &mut dyn PerturbationSource,
    observer: &mut dyn Observer,
    cancel: &CancelFlag,
    bounds: RunnerBounds,
) -> Result<PhaseStatus, PhaseError> {
    state.tick = 0;

    // Already-satisfied phase: zero ticks, one completion observation
    // carrying the unmodified entry state. Hooks are skipped.
    if !phase.should_continue(state) {
        info!(phase = phase.name(), "Phase already satisfied at entry");
        observer.observe(&Observation::new(phase.name(), state, EventTag::PhaseCompleted));
        return Ok(PhaseStatus::Completed);
    }

    if let Some(hook) = phase.entry_hook() {
        hook(state);
        settle(phase, state)?;
    }

    info!(
        phase = phase.name(),
        velocity = state.velocity,
        altitude = state.altitude,
        resource_level = state.resource_level,
        "Phase starting"
    );
    observer.observe(&Observation::new(phase.name(), state, EventTag::PhaseStarted));

    loop {
        // --- Tick boundary: the only cancellation point ---
        if cancel.is_requested() {
            warn!(
                phase = phase.name(),
                tick = state.tick,
                "Cancellation observed at tick boundary"
            );
            observer.observe(&Observation::new(
                phase.name(),
                state,
                EventTag::PhaseInterrupted,
            ));
            return Ok(PhaseStatus::Interrupted);
        }

        if bounds.tick_limit_reached(state.tick) {
            return Err(PhaseError::TickLimitExceeded {
                phase: phase.name().to_owned(),
                limit: bounds.max_ticks_per_phase,
            });
        }

        // --- One atomic tick ---
        let sample = source.sample(phase.perturbation());
        let mut next = phase.apply_update(state, sample);
        next.tick = state.tick.checked_add(1).ok_or_else(|| PhaseError::TickOverflow {
            phase: phase.name().to_owned(),
        })?;
        settle(phase, &mut next)?;
        *state = next;

        if let Some(interlock) = phase.interlock() {
            if interlock.is_tripped(state) {
                interlock.apply(state);
                settle(phase, state)?;
                warn!(phase = phase.name(), tick = state.tick, "Interlock tripped");
                observer.observe(&Observation::new(phase.name(), state, EventTag::Interlock));
            }
        }

        debug!(phase = phase.name(), tick = state.tick, "Tick committed");
        observer.observe(&Observation::new(phase.name(), state, EventTag::Tick));

        if !phase.should_continue(state) {
            if let Some(hook) = phase.exit_hook() {
                hook(state);
                settle(phase, state)?;
            }
            info!(phase = phase.name(), ticks = state.tick, "Phase completed");
            observer.observe(&Observation::new(
                phase.name(),
                state,
                EventTag::PhaseCompleted,
            ));
            return Ok(PhaseStatus::Completed);
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use voyage_types::StateField;

    use super::*;
    use crate::observer::RecordingObserver;
    use crate::perturbation::{PerturbationKind, SequenceSource};
    use crate::phase::Interlock;

    /// A phase that climbs 10 km per tick until 100 km.
    fn climb_phase() -> PhaseDefinition {
        PhaseDefinition::new(
            "climb",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.altitude += 10.0;
                next
            },
            |state| state.altitude < 100.0,
        )
        .with_fields(&[StateField::Altitude], &[StateField::Altitude])
    }

    fn run(
        phase: &PhaseDefinition,
        state: &mut StateVector,
        observer: &mut RecordingObserver,
    ) -> Result<PhaseStatus, PhaseError> {
        let mut source = SequenceSource::constant(0.0);
        run_phase(
            phase,
            state,
            &mut source,
            observer,
            &CancelFlag::new(),
            RunnerBounds::UNLIMITED,
        )
    }

    #[test]
    fn phase_runs_to_completion() {
        let phase = climb_phase();
        let mut state = StateVector::default();
        let mut observer = RecordingObserver::new();

        let status = run(&phase, &mut state, &mut observer).unwrap();

        assert_eq!(status, PhaseStatus::Completed);
        assert_eq!(state.altitude, 100.0);
        assert_eq!(state.tick, 10);
    }

    #[test]
    fn zero_tick_completion_preserves_entry_state() {
        let phase = climb_phase();
        let mut state = StateVector::default();
        state.altitude = 250.0;
        let entry = state;
        let mut observer = RecordingObserver::new();

        let status = run(&phase, &mut state, &mut observer).unwrap();

        assert_eq!(status, PhaseStatus::Completed);
        assert_eq!(observer.len(), 1);
        let only = &observer.observations()[0];
        assert_eq!(only.event, EventTag::PhaseCompleted);
        assert_eq!(only.tick, 0);
        // tick was reset, everything else untouched
        let mut expected = entry;
        expected.tick = 0;
        assert_eq!(only.state, expected);
    }

    #[test]
    fn tick_counter_increases_by_one_per_tick_observation() {
        let phase = climb_phase();
        let mut state = StateVector::default();
        let mut observer = RecordingObserver::new();

        run(&phase, &mut state, &mut observer).unwrap();

        let ticks: Vec<u64> = observer
            .observations()
            .iter()
            .filter(|observation| observation.event == EventTag::Tick)
            .map(|observation| observation.tick)
            .collect();
        assert_eq!(ticks, (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    fn completion_follows_final_tick_immediately() {
        let phase = climb_phase();
        let mut state = StateVector::default();
        let mut observer = RecordingObserver::new();

        run(&phase, &mut state, &mut observer).unwrap();

        let observations = observer.observations();
        let last = &observations[observations.len() - 1];
        let second_to_last = &observations[observations.len() - 2];
        assert_eq!(last.event, EventTag::PhaseCompleted);
        assert_eq!(second_to_last.event, EventTag::Tick);
        assert_eq!(last.tick, second_to_last.tick);
    }

    #[test]
    fn interlock_event_precedes_its_tick_event() {
        let phase = PhaseDefinition::new(
            "entry-heating",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.temperature += 600.0;
                next.altitude -= 10.0;
                next
            },
            |state| state.altitude > 0.0,
        )
        .with_interlock(Interlock::new(
            |state| state.temperature > 1_500.0,
            |state| state.temperature = 1_500.0,
        ));

        let mut state = StateVector::default();
        state.altitude = 50.0;
        let mut observer = RecordingObserver::new();

        run(&phase, &mut state, &mut observer).unwrap();

        // Heating crosses 1500 on tick 3 (1800 degrees) and trips the
        // interlock on every tick after that.
        let observations = observer.observations();
        let first_interlock = observations
            .iter()
            .position(|observation| observation.event == EventTag::Interlock)
            .unwrap();
        assert_eq!(observations[first_interlock].tick, 3);
        assert_eq!(observations[first_interlock].state.temperature, 1_500.0);

        // The very next record is the same tick's regular observation.
        let following = &observations[first_interlock + 1];
        assert_eq!(following.event, EventTag::Tick);
        assert_eq!(following.tick, 3);
    }

    #[test]
    fn pre_requested_cancellation_interrupts_before_any_tick() {
        let phase = climb_phase();
        let mut state = StateVector::default();
        let mut observer = RecordingObserver::new();
        let cancel = CancelFlag::new();
        cancel.request();

        let mut source = SequenceSource::constant(0.0);
        let status = run_phase(
            &phase,
            &mut state,
            &mut source,
            &mut observer,
            &cancel,
            RunnerBounds::UNLIMITED,
        )
        .unwrap();

        assert_eq!(status, PhaseStatus::Interrupted);
        assert_eq!(state.tick, 0);
        assert_eq!(state.altitude, 0.0);
    }

    /// Observer that requests cancellation after a given tick commits.
    struct CancelAfter {
        flag: CancelFlag,
        after_tick: u64,
        inner: RecordingObserver,
    }

    impl Observer for CancelAfter {
        fn observe(&mut self, observation: &Observation) {
            if observation.event == EventTag::Tick && observation.tick == self.after_tick {
                self.flag.request();
            }
            self.inner.observe(observation);
        }
    }

    #[test]
    fn cancellation_lands_between_ticks() {
        let phase = climb_phase();
        let mut state = StateVector::default();
        let cancel = CancelFlag::new();
        let mut observer = CancelAfter {
            flag: cancel.clone(),
            after_tick: 3,
            inner: RecordingObserver::new(),
        };

        let mut source = SequenceSource::constant(0.0);
        let status = run_phase(
            &phase,
            &mut state,
            &mut source,
            &mut observer,
            &cancel,
            RunnerBounds::UNLIMITED,
        )
        .unwrap();

        assert_eq!(status, PhaseStatus::Interrupted);
        // State is exactly as of tick 3 -- never a partially applied tick.
        assert_eq!(state.tick, 3);
        assert_eq!(state.altitude, 30.0);

        let last = observer.inner.observations().last().unwrap().clone();
        assert_eq!(last.event, EventTag::PhaseInterrupted);
        assert_eq!(last.tick, 3);
    }

    #[test]
    fn non_finite_update_fails_the_phase() {
        let phase = PhaseDefinition::new(
            "broken",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.velocity = f64::NAN;
                next
            },
            |state| state.velocity < 100.0,
        );

        let mut state = StateVector::default();
        let mut observer = RecordingObserver::new();
        let result = run(&phase, &mut state, &mut observer);

        assert!(matches!(result, Err(PhaseError::InvalidState { .. })));
    }

    #[test]
    fn runaway_phase_hits_the_tick_bound() {
        let phase = PhaseDefinition::new(
            "runaway",
            PerturbationKind::None,
            |state, _sample| *state,
            |_state| true,
        );

        let mut state = StateVector::default();
        let mut observer = RecordingObserver::new();
        let mut source = SequenceSource::constant(0.0);
        let result = run_phase(
            &phase,
            &mut state,
            &mut source,
            &mut observer,
            &CancelFlag::new(),
            RunnerBounds::new(5),
        );

        assert!(matches!(
            result,
            Err(PhaseError::TickLimitExceeded { limit: 5, .. })
        ));
        assert_eq!(state.tick, 5);
    }

    #[test]
    fn entry_and_exit_hooks_run_once() {
        let phase = PhaseDefinition::new(
            "hooked",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.position += 1.0;
                next
            },
            |state| state.position < 3.0,
        )
        .with_entry_hook(|state| state.temperature = -120.0)
        .with_exit_hook(|state| state.velocity = 0.0);

        let mut state = StateVector::default();
        state.velocity = 500.0;
        let mut observer = RecordingObserver::new();

        run(&phase, &mut state, &mut observer).unwrap();

        assert_eq!(state.temperature, -120.0);
        assert_eq!(state.velocity, 0.0);

        // The started observation already reflects the entry hook.
        let started = observer
            .observations()
            .iter()
            .find(|observation| observation.event == EventTag::PhaseStarted)
            .unwrap()
            .clone();
        assert_eq!(started.state.temperature, -120.0);
        assert_eq!(started.state.velocity, 500.0);
    }

    #[test]
    fn bounded_fields_stay_in_domain_every_tick() {
        let phase = PhaseDefinition::new(
            "stress",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.resource_level += 40.0;
                next.integrity -= 35.0;
                next.position += 1.0;
                next
            },
            |state| state.position < 6.0,
        );

        let mut state = StateVector::with_capacity(100.0);
        let mut observer = RecordingObserver::new();
        run(&phase, &mut state, &mut observer).unwrap();

        for observation in observer.observations() {
            assert!(observation.state.resource_level >= 0.0);
            assert!(observation.state.resource_level <= observation.state.capacity);
            assert!(observation.state.integrity >= 0.0);
            assert!(observation.state.integrity <= 100.0);
        }
        assert_eq!(state.resource_level, 100.0);
        assert_eq!(state.integrity, 0.0);
    }
}
