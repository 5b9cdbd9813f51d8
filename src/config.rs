use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/ziggurat.toml";

/// Simulation tuning knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks between pyramid structure validation and turbine scanning.
    pub scan_interval_ticks: u32,
    /// Maximum resident chunks in the demo world.
    pub chunk_capacity: usize,
    /// Ticks to run the demo simulation.
    pub demo_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scan_interval_ticks: 200,
            chunk_capacity: 64,
            demo_ticks: 400,
        }
    }
}

/// A configuration value outside its accepted range.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scan interval {0} outside accepted range 20..=10000")]
    ScanIntervalOutOfRange(u32),
    #[error("chunk capacity must be at least 1")]
    ZeroChunkCapacity,
}

impl SimulationConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on
    /// errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SimulationConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    SimulationConfig::default()
                }
            },
            Err(err) => {
                warn!("Failed to read {}: {err}. Using defaults", path.display());
                SimulationConfig::default()
            }
        }
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(20..=10_000).contains(&self.scan_interval_ticks) {
            return Err(ConfigError::ScanIntervalOutOfRange(self.scan_interval_ticks));
        }
        if self.chunk_capacity == 0 {
            return Err(ConfigError::ZeroChunkCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_scan_interval_is_rejected() {
        let cfg = SimulationConfig {
            scan_interval_ticks: 5,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ScanIntervalOutOfRange(5))
        ));
    }

    #[test]
    fn zero_chunk_capacity_is_rejected() {
        let cfg = SimulationConfig {
            chunk_capacity: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroChunkCapacity)));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: SimulationConfig = toml::from_str("scan_interval_ticks = 100").unwrap();
        assert_eq!(cfg.scan_interval_ticks, 100);
        assert_eq!(cfg.chunk_capacity, 64);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = SimulationConfig::load_from_path(Path::new("/nonexistent/ziggurat.toml"));
        assert_eq!(cfg.scan_interval_ticks, 200);
    }
}
