//! Declarative mission phase definitions.
//!
//! A [`PhaseDefinition`] expresses a mission phase as one immutable
//! configuration value: an update rule, a continuation predicate, an
//! optional safety interlock, entry/exit hooks, and a nominal tick
//! interval. The shared runner in [`crate::runner`] drives any phase
//! expressed this way -- there is no per-phase loop code.
//!
//! Update rules are pure: the next state is a function of the current
//! state and one perturbation sample, nothing else. Phases that need
//! randomness declare what to sample via [`PerturbationKind`]; fully
//! deterministic phases declare [`PerturbationKind::None`].

use std::fmt;
use std::time::Duration;

use voyage_types::{StateField, StateVector};

use crate::perturbation::PerturbationKind;

/// Pure update rule: current state + one perturbation sample -> next state.
pub type UpdateFn = Box<dyn Fn(&StateVector, f64) -> StateVector + Send + Sync>;

/// Predicate over a state snapshot.
pub type PredicateFn = Box<dyn Fn(&StateVector) -> bool + Send + Sync>;

/// In-place state mutation used by hooks and interlock actions.
pub type HookFn = Box<dyn Fn(&mut StateVector) + Send + Sync>;

/// Nominal pacing between ticks when no phase declares its own.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Interlock
// ---------------------------------------------------------------------------

/// A safety condition-action pair checked after every update.
///
/// When the condition holds, the action mutates the state (release
/// pressure, vent heat, damp a harvest) and the runner emits an
/// interlock-tagged observation before the tick's regular observation.
/// Interlocks are independent of the phase's completion condition.
pub struct Interlock {
    condition: PredicateFn,
    action: HookFn,
}

impl Interlock {
    /// Create an interlock from a condition and an action.
    pub fn new(
        condition: impl Fn(&StateVector) -> bool + Send + Sync + 'static,
        action: impl Fn(&mut StateVector) + Send + Sync + 'static,
    ) -> Self {
        Self {
            condition: Box::new(condition),
            action: Box::new(action),
        }
    }

    /// Whether the interlock condition holds for the given state.
    pub fn is_tripped(&self, state: &StateVector) -> bool {
        (self.condition)(state)
    }

    /// Apply the interlock action to the state.
    pub fn apply(&self, state: &mut StateVector) {
        (self.action)(state);
    }
}

impl fmt::Debug for Interlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interlock").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PhaseDefinition
// ---------------------------------------------------------------------------

/// Immutable declarative description of one mission phase.
///
/// Built once at mission-assembly time and never mutated afterwards.
/// The optional `driven_fields` / `halt_fields` declarations feed the
/// best-effort static validation in [`crate::mission::build_mission`]:
/// a phase whose predicate watches fields its update can never influence
/// cannot terminate and is rejected before any tick executes.
pub struct PhaseDefinition {
    name: String,
    perturbation: PerturbationKind,
    update: UpdateFn,
    continue_predicate: PredicateFn,
    interlock: Option<Interlock>,
    on_entry: Option<HookFn>,
    on_exit: Option<HookFn>,
    tick_interval: Duration,
    driven_fields: Vec<StateField>,
    halt_fields: Vec<StateField>,
}

impl PhaseDefinition {
    /// Create a phase from its name, perturbation kind, update rule, and
    /// continuation predicate. Everything else is attached with the
    /// `with_*` methods.
    pub fn new(
        name: impl Into<String>,
        perturbation: PerturbationKind,
        update: impl Fn(&StateVector, f64) -> StateVector + Send + Sync + 'static,
        continue_predicate: impl Fn(&StateVector) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            perturbation,
            update: Box::new(update),
            continue_predicate: Box::new(continue_predicate),
            interlock: None,
            on_entry: None,
            on_exit: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            driven_fields: Vec::new(),
            halt_fields: Vec::new(),
        }
    }

    /// Attach a safety interlock.
    #[must_use]
    pub fn with_interlock(mut self, interlock: Interlock) -> Self {
        self.interlock = Some(interlock);
        self
    }

    /// Attach a hook that runs once when the phase enters its tick loop.
    #[must_use]
    pub fn with_entry_hook(
        mut self,
        hook: impl Fn(&mut StateVector) + Send + Sync + 'static,
    ) -> Self {
        self.on_entry = Some(Box::new(hook));
        self
    }

    /// Attach a hook that runs once when the phase completes normally.
    #[must_use]
    pub fn with_exit_hook(
        mut self,
        hook: impl Fn(&mut StateVector) + Send + Sync + 'static,
    ) -> Self {
        self.on_exit = Some(Box::new(hook));
        self
    }

    /// Set the nominal pacing between ticks. The core never sleeps; this
    /// is a contract consumed by the presentation layer at tick
    /// boundaries.
    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Declare which fields the update rule drives and which fields the
    /// continuation predicate watches, enabling static validation.
    #[must_use]
    pub fn with_fields(mut self, driven: &[StateField], halt: &[StateField]) -> Self {
        self.driven_fields = driven.to_vec();
        self.halt_fields = halt.to_vec();
        self
    }

    /// The phase name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The perturbation the runner samples each tick.
    pub const fn perturbation(&self) -> &PerturbationKind {
        &self.perturbation
    }

    /// The nominal pacing between ticks.
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Apply the update rule to produce a candidate next state.
    ///
    /// The result is a candidate: the runner still clamps and validates
    /// it before committing.
    pub fn apply_update(&self, state: &StateVector, sample: f64) -> StateVector {
        (self.update)(state, sample)
    }

    /// Whether the phase should keep ticking from the given state.
    pub fn should_continue(&self, state: &StateVector) -> bool {
        (self.continue_predicate)(state)
    }

    /// The attached interlock, if any.
    pub const fn interlock(&self) -> Option<&Interlock> {
        self.interlock.as_ref()
    }

    /// The entry hook, if any.
    pub const fn entry_hook(&self) -> Option<&HookFn> {
        self.on_entry.as_ref()
    }

    /// The exit hook, if any.
    pub const fn exit_hook(&self) -> Option<&HookFn> {
        self.on_exit.as_ref()
    }

    /// Declared fields the update rule influences.
    pub fn driven_fields(&self) -> &[StateField] {
        &self.driven_fields
    }

    /// Declared fields the continuation predicate watches.
    pub fn halt_fields(&self) -> &[StateField] {
        &self.halt_fields
    }

    /// Best-effort static check that this phase can terminate.
    ///
    /// A phase passes if it declares nothing (unchecked), if its
    /// predicate watches the tick counter (the runner always advances
    /// it), or if at least one watched field is also driven by the
    /// update rule. Only declared phases can fail -- the check is
    /// best-effort, not exhaustive.
    pub fn can_terminate(&self) -> bool {
        if self.halt_fields.is_empty() {
            return true;
        }
        if self.halt_fields.contains(&StateField::Tick) {
            return true;
        }
        self.halt_fields
            .iter()
            .any(|field| self.driven_fields.contains(field))
    }
}

impl fmt::Debug for PhaseDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseDefinition")
            .field("name", &self.name)
            .field("perturbation", &self.perturbation)
            .field("tick_interval", &self.tick_interval)
            .field("has_interlock", &self.interlock.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn drift_phase() -> PhaseDefinition {
        PhaseDefinition::new(
            "drift",
            PerturbationKind::None,
            |state, _sample| {
                let mut next = *state;
                next.position += 10.0;
                next
            },
            |state| state.position < 100.0,
        )
    }

    #[test]
    fn apply_update_runs_the_rule() {
        let phase = drift_phase();
        let state = StateVector::default();
        let next = phase.apply_update(&state, 0.0);
        assert_eq!(next.position, 10.0);
    }

    #[test]
    fn should_continue_reads_the_predicate() {
        let phase = drift_phase();
        let mut state = StateVector::default();
        assert!(phase.should_continue(&state));
        state.position = 100.0;
        assert!(!phase.should_continue(&state));
    }

    #[test]
    fn interlock_trips_and_applies() {
        let interlock = Interlock::new(
            |state| state.temperature > 1_500.0,
            |state| state.temperature = 1_500.0,
        );

        let mut state = StateVector::default();
        state.temperature = 1_800.0;
        assert!(interlock.is_tripped(&state));
        interlock.apply(&mut state);
        assert_eq!(state.temperature, 1_500.0);
        assert!(!interlock.is_tripped(&state));
    }

    #[test]
    fn undeclared_phase_is_assumed_terminating() {
        assert!(drift_phase().can_terminate());
    }

    #[test]
    fn declared_disjoint_fields_cannot_terminate() {
        let phase = drift_phase().with_fields(&[StateField::Position], &[StateField::Velocity]);
        assert!(!phase.can_terminate());
    }

    #[test]
    fn tick_watching_predicate_always_terminates() {
        let phase = drift_phase().with_fields(&[StateField::Position], &[StateField::Tick]);
        assert!(phase.can_terminate());
    }

    #[test]
    fn overlapping_fields_terminate() {
        let phase = drift_phase().with_fields(
            &[StateField::Position, StateField::Velocity],
            &[StateField::Position],
        );
        assert!(phase.can_terminate());
    }

    #[test]
    fn debug_output_names_the_phase() {
        let text = format!("{:?}", drift_phase());
        assert!(text.contains("drift"));
    }
}
