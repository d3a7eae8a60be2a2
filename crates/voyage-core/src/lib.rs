//! Phased simulation engine for the Voyage workspace.
//!
//! This crate owns the tick loop that drives every mission phase: sample a
//! perturbation, apply the phase's update rule, clamp and validate the
//! state, fire interlocks, emit observations, and check the continuation
//! predicate. Phases are declarative [`PhaseDefinition`] values; the
//! [`MissionSequencer`] carries one [`StateVector`] through an ordered list
//! of them and reports the overall outcome.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `voyage-config.yaml` into
//!   strongly-typed structs.
//! - [`mission`] -- [`MissionSequencer`], `build_mission` validation, and
//!   mission-level errors.
//! - [`observer`] -- [`Observer`] trait plus no-op and recording
//!   implementations.
//! - [`perturbation`] -- [`PerturbationSource`] trait with seeded,
//!   scripted, and entropy-backed implementations.
//! - [`phase`] -- Declarative [`PhaseDefinition`] and [`Interlock`].
//! - [`profiles`] -- The canonical mission phase library.
//! - [`runner`] -- The single-phase tick loop, cancellation flag, and
//!   runner bounds.
//! - [`state`] -- Clamping and finite-validation over the state vector.
//!
//! [`PhaseDefinition`]: phase::PhaseDefinition
//! [`Interlock`]: phase::Interlock
//! [`MissionSequencer`]: mission::MissionSequencer
//! [`StateVector`]: voyage_types::StateVector
//! [`Observer`]: observer::Observer
//! [`PerturbationSource`]: perturbation::PerturbationSource

pub mod config;
pub mod mission;
pub mod observer;
pub mod perturbation;
pub mod phase;
pub mod profiles;
pub mod runner;
pub mod state;
