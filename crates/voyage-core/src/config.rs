//! Configuration loading and typed config structures for the driver.
//!
//! The canonical configuration lives in `voyage-config.yaml` at the
//! workspace root. This module defines strongly-typed structs that mirror
//! the YAML structure, and provides a loader that reads the file. Every
//! field has a sensible default, so an empty file (or no file at all) is
//! a valid configuration.

use std::path::Path;

use serde::Deserialize;

use crate::runner::RunnerBounds;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `voyage-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Run-level settings (seed, pacing).
    #[serde(default)]
    pub run: RunConfig,

    /// Safety bounds.
    #[serde(default)]
    pub bounds: BoundsConfig,

    /// Mission selection.
    #[serde(default)]
    pub mission: MissionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Seed for the perturbation source. 0 selects thread-local entropy
    /// (non-reproducible); any other value selects a seeded stream.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds between ticks. 0 uses each phase's own
    /// tick-interval contract.
    #[serde(default)]
    pub tick_interval_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_interval_ms: 0,
        }
    }
}

/// Safety-bound configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoundsConfig {
    /// Maximum ticks a single phase may run (0 = unlimited).
    #[serde(default = "default_max_ticks_per_phase")]
    pub max_ticks_per_phase: u64,
}

impl BoundsConfig {
    /// Convert to the runner's bounds value.
    pub const fn runner_bounds(&self) -> RunnerBounds {
        RunnerBounds::new(self.max_ticks_per_phase)
    }
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks_per_phase: default_max_ticks_per_phase(),
        }
    }
}

/// Mission selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MissionConfig {
    /// Name of the mission profile to fly (see the profile catalog).
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_max_ticks_per_phase() -> u64 {
    1_000_000
}

fn default_profile() -> String {
    String::from("arrival")
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn parse_empty_yaml_uses_defaults() {
        let config = EngineConfig::parse("").unwrap();
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.run.tick_interval_ms, 0);
        assert_eq!(config.bounds.max_ticks_per_phase, 1_000_000);
        assert_eq!(config.mission.profile, "arrival");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
run:
  seed: 7
  tick_interval_ms: 25
bounds:
  max_ticks_per_phase: 500
mission:
  profile: landing
logging:
  level: debug
";
        let config = EngineConfig::parse(yaml).unwrap();
        assert_eq!(config.run.seed, 7);
        assert_eq!(config.run.tick_interval_ms, 25);
        assert_eq!(config.bounds.max_ticks_per_phase, 500);
        assert_eq!(config.mission.profile, "landing");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = EngineConfig::parse("mission:\n  profile: outbound\n").unwrap();
        assert_eq!(config.mission.profile, "outbound");
        assert_eq!(config.run.seed, 42);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = EngineConfig::parse("run: [not, a, mapping]");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn bounds_convert_to_runner_bounds() {
        let config = EngineConfig::parse("bounds:\n  max_ticks_per_phase: 9\n").unwrap();
        assert!(config.bounds.runner_bounds().tick_limit_reached(9));
        assert!(!config.bounds.runner_bounds().tick_limit_reached(8));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("voyage-config.yaml");
        if path.exists() {
            let config = EngineConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
