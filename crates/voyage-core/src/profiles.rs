//! The canonical mission phase library.
//!
//! Factory functions building the [`PhaseDefinition`]s for the classic
//! interplanetary mission legs -- launch ascent, trans-orbital injection,
//! deep-space cruise, flip-and-burn deceleration, orbital insertion,
//! de-orbit, atmospheric entry, powered descent, surface resource
//! harvesting, and the return legs -- plus named mission assemblies for
//! the driver.
//!
//! Every update rule here is a first-order explicit integration: next
//! state is current state plus one per-tick delta. Where a quantity
//! crosses its target inside a tick, the rule clamps it to the target in
//! that same tick rather than letting it drift past or snapping it to an
//! arbitrary fallback.

use std::time::Duration;

use voyage_types::{StateField, StateVector};

use crate::perturbation::PerturbationKind;
use crate::phase::{Interlock, PhaseDefinition};

/// Low parking orbit altitude (km).
pub const LOW_ORBIT_ALTITUDE_KM: f64 = 400.0;

/// Escape velocity from the departure body (km/h).
pub const ESCAPE_VELOCITY_KMH: f64 = 40_320.0;

/// Fast-transfer injection target: 1.5 x escape velocity (km/h).
pub const TRANSFER_VELOCITY_KMH: f64 = 60_480.0;

/// Orbital capture velocity at the destination (km/h).
pub const ORBITAL_CAPTURE_VELOCITY_KMH: f64 = 14_000.0;

/// Peak cruise velocity on the transfer trajectory (km/h).
pub const CRUISE_VELOCITY_KMH: f64 = 1_200_000.0;

/// Total transfer distance between the two bodies (km).
const TRANSFER_DISTANCE_KM: f64 = 225_000_000.0;

/// Distance remaining at the braking midpoint (km).
const BRAKING_START_DISTANCE_KM: f64 = 112_500_000.0;

/// Distance covered per cruise leg (km): one sixth of the transfer.
const CRUISE_LEG_KM: f64 = 37_500_000.0;

/// Nominal feed pressure of the main engines (bar).
const FUEL_PRESSURE_BAR: f64 = 78.0;

/// Rated hull temperature ceiling during destination entry (degrees C).
const HULL_TEMP_CEILING_C: f64 = 1_500.0;

/// Rated hull ceiling during the much denser home-atmosphere entry.
const REENTRY_TEMP_CEILING_C: f64 = 3_500.0;

/// Terminal velocity floor once the atmosphere carries the descent (km/h).
const TERMINAL_VELOCITY_KMH: f64 = 1_500.0;

/// Altitude of the entry interface above the destination surface (m).
const ENTRY_INTERFACE_ALTITUDE_M: f64 = 125_000.0;

/// Altitude where powered descent takes over from entry braking (m).
const FINAL_APPROACH_ALTITUDE_M: f64 = 10_000.0;

// Tick counts stay far below 2^53, so the conversion is exact.
#[allow(clippy::cast_precision_loss)]
const fn tick_to_f64(tick: u64) -> f64 {
    tick as f64
}

// ---------------------------------------------------------------------------
// Outbound legs
// ---------------------------------------------------------------------------

/// Launch ascent: aggressive multiplicative acceleration and climb until
/// the parking orbit altitude is reached.
pub fn launch_ascent() -> PhaseDefinition {
    PhaseDefinition::new(
        "launch-ascent",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.velocity = state.velocity * 1.05 + 150.0;
            next.altitude = state.altitude + next.velocity / 3_600.0;
            next
        },
        |state| state.altitude < LOW_ORBIT_ALTITUDE_KM,
    )
    .with_fields(
        &[StateField::Velocity, StateField::Altitude],
        &[StateField::Altitude],
    )
    .with_tick_interval(Duration::from_millis(80))
}

/// Trans-orbital injection burn: acceleration proportional to feed
/// pressure plus burn duration, clamped to the transfer velocity in the
/// crossing tick.
pub fn injection_burn() -> PhaseDefinition {
    PhaseDefinition::new(
        "injection-burn",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            let burn_second = tick_to_f64(state.tick.saturating_add(1));
            let acceleration = state.resource_level * 100.0 + burn_second * 50.0;
            next.velocity = (state.velocity + acceleration).min(TRANSFER_VELOCITY_KMH);
            next
        },
        |state| state.velocity < TRANSFER_VELOCITY_KMH,
    )
    .with_fields(&[StateField::Velocity], &[StateField::Velocity])
    .with_tick_interval(Duration::from_millis(100))
}

/// Deep-space cruise: one fixed distance leg per tick with steady fuel
/// draw, until the remaining distance reaches zero.
pub fn deep_space_cruise() -> PhaseDefinition {
    PhaseDefinition::new(
        "deep-space-cruise",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.position = (state.position - CRUISE_LEG_KM).max(0.0);
            next.resource_level = state.resource_level - 5.0;
            next
        },
        |state| state.position > 0.0,
    )
    .with_fields(
        &[StateField::Position, StateField::ResourceLevel],
        &[StateField::Position],
    )
    .with_tick_interval(Duration::from_millis(800))
}

// ---------------------------------------------------------------------------
// Arrival legs
// ---------------------------------------------------------------------------

/// Flip-and-burn deceleration: braking force proportional to feed
/// pressure with a bounded random component, clamped to the orbital
/// capture velocity in the crossing tick. Structural stress lands every
/// tenth burn cycle.
pub fn deceleration_burn() -> PhaseDefinition {
    PhaseDefinition::new(
        "deceleration-burn",
        PerturbationKind::Uniform {
            low: 0.0,
            high: 500.0,
        },
        |state, sample| {
            let mut next = *state;
            let deceleration = state.resource_level * 200.0 + sample;
            next.velocity = (state.velocity - deceleration).max(ORBITAL_CAPTURE_VELOCITY_KMH);
            next.position = state.position - (next.velocity / 3_600.0) * 0.1;
            let burn_cycle = state.tick.saturating_add(1);
            if burn_cycle.checked_rem(10) == Some(0) {
                next.integrity = state.integrity - sample / 10_000.0;
            }
            next
        },
        |state| state.velocity > ORBITAL_CAPTURE_VELOCITY_KMH,
    )
    .with_fields(
        &[
            StateField::Velocity,
            StateField::Position,
            StateField::Integrity,
        ],
        &[StateField::Velocity],
    )
    .with_tick_interval(Duration::from_millis(50))
}

/// Orbital insertion: fixed descent steps from the capture orbit down to
/// the low parking orbit, clamped at the target altitude.
pub fn orbital_insertion() -> PhaseDefinition {
    PhaseDefinition::new(
        "orbital-insertion",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.altitude = (state.altitude - 2_000.0).max(LOW_ORBIT_ALTITUDE_KM);
            next
        },
        |state| state.altitude > LOW_ORBIT_ALTITUDE_KM,
    )
    .with_fields(&[StateField::Altitude], &[StateField::Altitude])
    .with_tick_interval(Duration::from_millis(100))
}

// ---------------------------------------------------------------------------
// Landing legs
// ---------------------------------------------------------------------------

/// De-orbit burn: fixed braking steps from orbital velocity down to the
/// entry-interface velocity.
pub fn deorbit_burn() -> PhaseDefinition {
    PhaseDefinition::new(
        "deorbit-burn",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.velocity = (state.velocity - 2_000.0).max(8_000.0);
            next
        },
        |state| state.velocity > 8_000.0,
    )
    .with_fields(&[StateField::Velocity], &[StateField::Velocity])
    .with_tick_interval(Duration::from_millis(800))
}

/// Atmospheric entry: velocity-proportional altitude loss with
/// aerodynamic drag decaying toward terminal velocity, and frictional
/// heating with a thermal interlock that vents the hull back to its
/// rated ceiling.
pub fn atmospheric_entry() -> PhaseDefinition {
    PhaseDefinition::new(
        "atmospheric-entry",
        PerturbationKind::Uniform {
            low: 50.0,
            high: 150.0,
        },
        |state, sample| {
            let mut next = *state;
            next.altitude = (state.altitude - state.velocity / 4.0).max(FINAL_APPROACH_ALTITUDE_M);
            next.temperature = state.temperature + sample;
            next.velocity = (state.velocity * 0.95).max(TERMINAL_VELOCITY_KMH);
            next
        },
        |state| state.altitude > FINAL_APPROACH_ALTITUDE_M,
    )
    .with_interlock(Interlock::new(
        |state| state.temperature > HULL_TEMP_CEILING_C,
        |state| state.temperature = HULL_TEMP_CEILING_C,
    ))
    .with_fields(
        &[
            StateField::Altitude,
            StateField::Temperature,
            StateField::Velocity,
        ],
        &[StateField::Altitude],
    )
    .with_tick_interval(Duration::from_millis(100))
}

/// Powered descent: fuel-burning final approach with piecewise braking
/// (steady velocity bleed above 1 km, altitude-proportional braking
/// below) and a touchdown contact rule that zeroes altitude and
/// velocity together.
pub fn powered_descent() -> PhaseDefinition {
    PhaseDefinition::new(
        "powered-descent",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.resource_level = state.resource_level - 0.1;
            next.altitude = state.altitude - state.velocity / 10.0;
            if next.altitude < 1_000.0 {
                // Soft-touch law: vertical speed follows half the altitude.
                next.velocity = state.velocity.min(next.altitude / 2.0);
            } else if state.velocity > 300.0 {
                next.velocity = state.velocity - 50.0;
            }
            if next.altitude < 5.0 {
                next.altitude = 0.0;
                next.velocity = 0.0;
            }
            next
        },
        |state| state.altitude > 0.0,
    )
    .with_fields(
        &[
            StateField::Altitude,
            StateField::Velocity,
            StateField::ResourceLevel,
        ],
        &[StateField::Altitude],
    )
    .with_tick_interval(Duration::from_millis(150))
}

// ---------------------------------------------------------------------------
// Surface and return legs
// ---------------------------------------------------------------------------

/// Surface harvest: ambient radiation converted to fuel at a bounded
/// random rate per cycle until the tanks are full.
pub fn surface_harvest() -> PhaseDefinition {
    PhaseDefinition::new(
        "surface-harvest",
        PerturbationKind::Uniform {
            low: 1.2,
            high: 2.5,
        },
        |state, sample| {
            let mut next = *state;
            next.resource_level = state.resource_level + sample;
            next
        },
        |state| state.resource_level < state.capacity,
    )
    .with_fields(&[StateField::ResourceLevel], &[StateField::ResourceLevel])
    .with_tick_interval(Duration::from_millis(300))
}

/// Ascent from the low-gravity surface: five fixed climb steps to escape
/// the destination's gravity well.
pub fn surface_ascent() -> PhaseDefinition {
    PhaseDefinition::new(
        "surface-ascent",
        PerturbationKind::None,
        |state, _sample| {
            let mut next = *state;
            next.velocity = state.velocity + 5_000.0;
            next.altitude = state.altitude + 50.0;
            next.resource_level = state.resource_level - 0.5;
            next
        },
        |state| state.tick < 5,
    )
    .with_fields(
        &[
            StateField::Velocity,
            StateField::Altitude,
            StateField::ResourceLevel,
        ],
        &[StateField::Tick],
    )
    .with_tick_interval(Duration::from_millis(500))
}

/// Home-atmosphere entry: fixed altitude steps through a far denser
/// atmosphere, plasma heating with a critical-load interlock, down to
/// splashdown.
pub fn home_reentry() -> PhaseDefinition {
    PhaseDefinition::new(
        "home-reentry",
        PerturbationKind::Uniform {
            low: 0.0,
            high: 1_500.0,
        },
        |state, sample| {
            let mut next = *state;
            next.altitude = (state.altitude - 2_500.0).max(0.0);
            next.temperature = 2_000.0 + sample;
            next
        },
        |state| state.altitude > 0.0,
    )
    .with_interlock(Interlock::new(
        |state| state.temperature > REENTRY_TEMP_CEILING_C,
        |state| state.temperature = REENTRY_TEMP_CEILING_C,
    ))
    .with_fields(
        &[StateField::Altitude, StateField::Temperature],
        &[StateField::Altitude],
    )
    .with_tick_interval(Duration::from_millis(100))
}

// ---------------------------------------------------------------------------
// Mission assemblies
// ---------------------------------------------------------------------------

/// Outbound mission: ascent to parking orbit, injection burn, and the
/// cruise out to the braking midpoint.
pub fn outbound_mission() -> (Vec<PhaseDefinition>, StateVector) {
    let mut entry = StateVector::with_capacity(100.0);
    entry.resource_level = 98.0;
    entry.position = TRANSFER_DISTANCE_KM;
    (
        vec![launch_ascent(), injection_burn(), deep_space_cruise()],
        entry,
    )
}

/// Arrival mission: flip-and-burn deceleration from cruise velocity and
/// insertion into the low parking orbit.
pub fn arrival_mission() -> (Vec<PhaseDefinition>, StateVector) {
    let mut entry = StateVector::with_capacity(100.0);
    entry.velocity = CRUISE_VELOCITY_KMH;
    entry.position = BRAKING_START_DISTANCE_KM;
    entry.resource_level = FUEL_PRESSURE_BAR;
    entry.altitude = 20_000.0;
    (vec![deceleration_burn(), orbital_insertion()], entry)
}

/// Landing mission: de-orbit burn, atmospheric entry, and powered
/// descent to touchdown.
pub fn landing_mission() -> (Vec<PhaseDefinition>, StateVector) {
    let mut entry = StateVector::with_capacity(100.0);
    entry.velocity = 14_000.0;
    entry.altitude = ENTRY_INTERFACE_ALTITUDE_M;
    entry.resource_level = 12.0;
    entry.temperature = -120.0;
    (
        vec![deorbit_burn(), atmospheric_entry(), powered_descent()],
        entry,
    )
}

/// Surface operations mission: harvest ambient radiation into the tanks
/// until full.
pub fn surface_operations_mission() -> (Vec<PhaseDefinition>, StateVector) {
    let mut entry = StateVector::with_capacity(100.0);
    entry.resource_level = 9.5;
    entry.temperature = -63.0;
    (vec![surface_harvest()], entry)
}

/// Return mission: surface ascent, the cruise home, and entry through
/// the dense home atmosphere to splashdown.
pub fn return_mission() -> (Vec<PhaseDefinition>, StateVector) {
    let mut entry = StateVector::with_capacity(100.0);
    entry.resource_level = 74.8;
    entry.position = TRANSFER_DISTANCE_KM;
    entry.altitude = 100_000.0;
    entry.temperature = -60.0;
    (vec![surface_ascent(), deep_space_cruise(), home_reentry()], entry)
}

/// Names of the missions in the catalog, in flight order.
pub const MISSION_NAMES: [&str; 5] = [
    "outbound",
    "arrival",
    "landing",
    "surface-operations",
    "return",
];

/// Look up a mission assembly by name.
///
/// Returns the phase list and the canonical entry state, or `None` for
/// an unknown name.
pub fn mission_by_name(name: &str) -> Option<(Vec<PhaseDefinition>, StateVector)> {
    match name {
        "outbound" => Some(outbound_mission()),
        "arrival" => Some(arrival_mission()),
        "landing" => Some(landing_mission()),
        "surface-operations" => Some(surface_operations_mission()),
        "return" => Some(return_mission()),
        _ => None,
    }
}
