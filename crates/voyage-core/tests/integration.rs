//! End-to-end scenarios for the Voyage engine.
//!
//! These tests drive full missions through `build_mission` and
//! `MissionSequencer::run` with scripted or seeded perturbation sources
//! and assert on the resulting observation streams and outcomes.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::too_many_lines
)]

use voyage_core::mission::build_mission;
use voyage_core::observer::{Observer, RecordingObserver};
use voyage_core::perturbation::{PerturbationKind, SeededSource, SequenceSource};
use voyage_core::phase::{Interlock, PhaseDefinition};
use voyage_core::profiles;
use voyage_core::runner::{CancelFlag, RunnerBounds};
use voyage_types::{EventTag, MissionStatus, Observation, StateField, StateVector};

// =============================================================================
// Scenario A: deceleration to orbital capture
// =============================================================================

#[test]
fn scenario_a_deceleration_reaches_target_in_exactly_77_ticks() {
    let mut entry = StateVector::with_capacity(100.0);
    entry.velocity = 1_200_000.0;
    entry.resource_level = 78.0; // 78 bar x 200 = 15,600 km/h per tick

    let mission = build_mission(vec![profiles::deceleration_burn()], entry).unwrap();
    let mut source = SequenceSource::constant(0.0);
    let mut observer = RecordingObserver::new();
    let outcome = mission
        .run(&mut source, &mut observer, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.status, MissionStatus::Completed);
    assert_eq!(outcome.final_state.tick, 77);
    assert_eq!(outcome.final_state.velocity, 14_000.0);

    // The tick before the crossing is still above the target: the clamp
    // lands in the crossing tick, never earlier and never past it.
    let ticks: Vec<&Observation> = observer
        .observations()
        .iter()
        .filter(|observation| observation.event == EventTag::Tick)
        .collect();
    assert_eq!(ticks.len(), 77);
    assert_eq!(ticks[75].state.velocity, 14_400.0);
    assert_eq!(ticks[76].state.velocity, 14_000.0);
}

// =============================================================================
// Scenario B: resource harvest to exact capacity
// =============================================================================

#[test]
fn scenario_b_harvest_completes_at_tick_40_with_exact_capacity() {
    let entry = StateVector::with_capacity(100.0);

    let mission = build_mission(vec![profiles::surface_harvest()], entry).unwrap();
    let mut source = SequenceSource::constant(2.5);
    let mut observer = RecordingObserver::new();
    let outcome = mission
        .run(&mut source, &mut observer, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.status, MissionStatus::Completed);
    assert_eq!(outcome.final_state.tick, 40);
    assert_eq!(outcome.final_state.resource_level, 100.0);

    // No overshoot at any point in the stream.
    for observation in observer.observations() {
        assert!(observation.state.resource_level <= 100.0);
    }
}

// =============================================================================
// Scenario C: phase-boundary carry-over trips the next phase's interlock
// =============================================================================

#[test]
fn scenario_c_carried_integrity_trips_the_interlock_on_the_first_tick() {
    // Phase 1 grinds integrity from 100 down to 40.
    let stress = PhaseDefinition::new(
        "structural-stress",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.integrity -= 20.0;
            next
        },
        |state| state.integrity > 40.0,
    )
    .with_fields(&[StateField::Integrity], &[StateField::Integrity]);

    // Phase 2 cruises, but its interlock watches for weakened armor.
    let guarded_cruise = PhaseDefinition::new(
        "guarded-cruise",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.position += 100.0;
            next
        },
        |state| state.position < 300.0,
    )
    .with_interlock(Interlock::new(
        |state| state.integrity < 50.0,
        |state| state.velocity = state.velocity.min(500.0),
    ))
    .with_fields(&[StateField::Position], &[StateField::Position]);

    let mut entry = StateVector::with_capacity(100.0);
    entry.velocity = 2_000.0;

    let mission = build_mission(vec![stress, guarded_cruise], entry).unwrap();
    let mut source = SequenceSource::constant(0.0);
    let mut observer = RecordingObserver::new();
    let outcome = mission
        .run(&mut source, &mut observer, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.status, MissionStatus::Completed);
    assert_eq!(outcome.final_state.integrity, 40.0);

    // The very first tick of phase 2 carries an interlock event.
    let first_cruise_record = observer
        .observations()
        .iter()
        .position(|observation| {
            observation.phase_name == "guarded-cruise" && observation.tick == 1
        })
        .unwrap();
    assert_eq!(
        observer.observations()[first_cruise_record].event,
        EventTag::Interlock
    );
    // And the interlock's speed limit took effect.
    assert_eq!(outcome.final_state.velocity, 500.0);
}

// =============================================================================
// Deterministic replay
// =============================================================================

#[test]
fn identical_seeds_replay_identical_observation_sequences() {
    let run = |seed: u64| -> Vec<Observation> {
        let (phases, entry) = profiles::arrival_mission();
        let mission = build_mission(phases, entry).unwrap();
        let mut source = SeededSource::new(seed);
        let mut observer = RecordingObserver::new();
        mission
            .run(&mut source, &mut observer, &CancelFlag::new())
            .unwrap();
        observer.into_observations()
    };

    let first = run(1_234);
    let second = run(1_234);
    assert_eq!(first, second);

    let different = run(5_678);
    assert_ne!(first, different);
}

#[test]
fn tick_counters_are_strictly_monotonic_within_each_phase() {
    let (phases, entry) = profiles::landing_mission();
    let mission = build_mission(phases, entry).unwrap();
    let mut source = SeededSource::new(99);
    let mut observer = RecordingObserver::new();
    mission
        .run(&mut source, &mut observer, &CancelFlag::new())
        .unwrap();

    let mut current_phase = String::new();
    let mut last_tick = 0_u64;
    for observation in observer.observations() {
        if observation.event != EventTag::Tick {
            continue;
        }
        if observation.phase_name != current_phase {
            current_phase = observation.phase_name.clone();
            assert_eq!(observation.tick, 1, "phase '{current_phase}' skipped tick 1");
        } else {
            assert_eq!(
                observation.tick,
                last_tick + 1,
                "tick gap in phase '{current_phase}'"
            );
        }
        last_tick = observation.tick;
    }
}

// =============================================================================
// Cancellation at the tick boundary
// =============================================================================

/// Observer that requests cancellation once a given tick of a given
/// phase has been committed.
struct CancelAtTick {
    flag: CancelFlag,
    phase_name: &'static str,
    after_tick: u64,
}

impl Observer for CancelAtTick {
    fn observe(&mut self, observation: &Observation) {
        if observation.event == EventTag::Tick
            && observation.phase_name == self.phase_name
            && observation.tick == self.after_tick
        {
            self.flag.request();
        }
    }
}

#[test]
fn cancellation_after_tick_k_preserves_the_state_of_tick_k() {
    let mut entry = StateVector::with_capacity(100.0);
    entry.velocity = 1_200_000.0;
    entry.resource_level = 78.0;

    let mission = build_mission(vec![profiles::deceleration_burn()], entry).unwrap();
    let cancel = CancelFlag::new();
    let mut observer = CancelAtTick {
        flag: cancel.clone(),
        phase_name: "deceleration-burn",
        after_tick: 25,
    };
    let mut source = SequenceSource::constant(0.0);
    let outcome = mission.run(&mut source, &mut observer, &cancel).unwrap();

    assert_eq!(outcome.status, MissionStatus::Aborted);
    assert_eq!(outcome.phase_index_at_stop, 0);
    // Exactly 25 ticks of deceleration were applied -- never a partial 26th.
    assert_eq!(outcome.final_state.tick, 25);
    assert_eq!(outcome.final_state.velocity, 1_200_000.0 - 25.0 * 15_600.0);
}

// =============================================================================
// Build-time validation and the runaway safety valve
// =============================================================================

#[test]
fn build_rejects_an_empty_mission() {
    let result = build_mission(Vec::new(), StateVector::default());
    assert!(result.is_err());
}

#[test]
fn runaway_phase_is_stopped_by_the_tick_bound() {
    let hover = PhaseDefinition::new(
        "hover",
        PerturbationKind::None,
        |state, _sample| *state,
        |_state| true,
    );

    let mission = build_mission(vec![hover], StateVector::default())
        .unwrap()
        .with_bounds(RunnerBounds::new(100));
    let mut source = SequenceSource::constant(0.0);
    let mut observer = RecordingObserver::new();
    let result = mission.run(&mut source, &mut observer, &CancelFlag::new());

    assert!(result.is_err());
}

#[test]
fn zero_tick_phase_emits_one_completion_for_the_whole_stream() {
    // Second phase's predicate is already false against the state the
    // first phase leaves behind.
    let climb = PhaseDefinition::new(
        "climb",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.altitude += 100.0;
            next
        },
        |state| state.altitude < 400.0,
    );
    let already_there = PhaseDefinition::new(
        "circularize",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.altitude -= 10.0;
            next
        },
        |state| state.altitude > 400.0,
    );

    let mission =
        build_mission(vec![climb, already_there], StateVector::default()).unwrap();
    let mut source = SequenceSource::constant(0.0);
    let mut observer = RecordingObserver::new();
    let outcome = mission
        .run(&mut source, &mut observer, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.status, MissionStatus::Completed);
    assert_eq!(outcome.final_state.altitude, 400.0);

    let circularize: Vec<&Observation> = observer
        .observations()
        .iter()
        .filter(|observation| observation.phase_name == "circularize")
        .collect();
    assert_eq!(circularize.len(), 1);
    assert_eq!(circularize[0].event, EventTag::PhaseCompleted);
    assert_eq!(circularize[0].tick, 0);
    assert_eq!(circularize[0].state.altitude, 400.0);
}
