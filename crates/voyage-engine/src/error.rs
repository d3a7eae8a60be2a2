//! Error types for the mission driver binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during driver startup and mission execution.

/// Top-level error for the mission driver binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: voyage_core::config::ConfigError,
    },

    /// Mission assembly failed validation.
    #[error("build error: {source}")]
    Build {
        /// The underlying build error.
        #[from]
        source: voyage_core::mission::BuildError,
    },

    /// The mission run failed.
    #[error("mission error: {source}")]
    Mission {
        /// The underlying mission error.
        #[from]
        source: voyage_core::mission::MissionError,
    },

    /// The configured mission profile does not exist.
    #[error("unknown mission profile '{name}' (expected one of: outbound, arrival, landing, surface-operations, return)")]
    UnknownMission {
        /// The rejected profile name.
        name: String,
    },

    /// The run thread failed to complete.
    #[error("runtime error: {message}")]
    Runtime {
        /// Description of the runtime failure.
        message: String,
    },
}
