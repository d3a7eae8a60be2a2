//! Clamping and validation for the physical state vector.
//!
//! Every committed mutation of a [`StateVector`] passes through this
//! module: [`clamp`] forces the bounded fields back into their domain and
//! [`ensure_finite`] rejects states that picked up a NaN or infinity from
//! a misbehaving update rule. The runner applies both to a candidate state
//! before committing it, so callers never observe a partially applied or
//! out-of-domain tick.
//!
//! Clamping is idempotent: applying it to an already-in-range state is a
//! no-op. There is no silent fallback for non-finite values -- those are
//! a bug in a phase's update rule and fail the run.

use voyage_types::{StateField, StateVector};

/// Errors produced by state validation.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// A state field holds a NaN or infinite value.
    #[error("non-finite value in state field {field:?}")]
    NonFinite {
        /// The offending field.
        field: StateField,
    },

    /// The resource capacity is zero, negative, or non-finite.
    #[error("invalid resource capacity: {capacity}")]
    InvalidCapacity {
        /// The rejected capacity value.
        capacity: f64,
    },
}

/// Clamp the bounded fields of a state vector to their domain.
///
/// - `resource_level` is clamped to `[0, capacity]`
/// - `integrity` is clamped to `[0, 100]`
///
/// The unbounded fields (velocity, position, altitude, temperature) are
/// left untouched; their limits, where any exist, belong to the phase
/// update rules.
pub fn clamp(state: &mut StateVector) {
    state.resource_level = state.resource_level.clamp(0.0, state.capacity);
    state.integrity = state.integrity.clamp(0.0, StateVector::MAX_INTEGRITY);
}

/// Verify that every float field of the state is finite and the capacity
/// is positive.
///
/// # Errors
///
/// Returns [`StateError::NonFinite`] naming the first offending field, or
/// [`StateError::InvalidCapacity`] if the capacity cannot bound a resource.
pub fn ensure_finite(state: &StateVector) -> Result<(), StateError> {
    let fields = [
        (StateField::Velocity, state.velocity),
        (StateField::Position, state.position),
        (StateField::Altitude, state.altitude),
        (StateField::ResourceLevel, state.resource_level),
        (StateField::Temperature, state.temperature),
        (StateField::Integrity, state.integrity),
    ];

    for (field, value) in fields {
        if !value.is_finite() {
            return Err(StateError::NonFinite { field });
        }
    }

    if !state.capacity.is_finite() || state.capacity <= 0.0 {
        return Err(StateError::InvalidCapacity {
            capacity: state.capacity,
        });
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn clamp_caps_resource_at_capacity() {
        let mut state = StateVector::with_capacity(100.0);
        state.resource_level = 104.5;
        clamp(&mut state);
        assert_eq!(state.resource_level, 100.0);
    }

    #[test]
    fn clamp_floors_resource_at_zero() {
        let mut state = StateVector::with_capacity(100.0);
        state.resource_level = -3.0;
        clamp(&mut state);
        assert_eq!(state.resource_level, 0.0);
    }

    #[test]
    fn clamp_bounds_integrity_both_ways() {
        let mut state = StateVector::default();
        state.integrity = 120.0;
        clamp(&mut state);
        assert_eq!(state.integrity, 100.0);

        state.integrity = -0.5;
        clamp(&mut state);
        assert_eq!(state.integrity, 0.0);
    }

    #[test]
    fn clamp_is_idempotent_on_in_range_values() {
        let mut state = StateVector::with_capacity(100.0);
        state.resource_level = 42.5;
        state.integrity = 87.25;

        let before = state;
        clamp(&mut state);
        assert_eq!(state, before);
    }

    #[test]
    fn ensure_finite_accepts_ordinary_state() {
        let state = StateVector::default();
        assert!(ensure_finite(&state).is_ok());
    }

    #[test]
    fn ensure_finite_names_the_offending_field() {
        let mut state = StateVector::default();
        state.temperature = f64::NAN;

        let err = ensure_finite(&state);
        assert!(matches!(
            err,
            Err(StateError::NonFinite {
                field: StateField::Temperature
            })
        ));
    }

    #[test]
    fn ensure_finite_rejects_infinite_velocity() {
        let mut state = StateVector::default();
        state.velocity = f64::INFINITY;
        assert!(ensure_finite(&state).is_err());
    }

    #[test]
    fn ensure_finite_rejects_degenerate_capacity() {
        let mut state = StateVector::default();
        state.capacity = 0.0;
        assert!(matches!(
            ensure_finite(&state),
            Err(StateError::InvalidCapacity { .. })
        ));
    }
}
