use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::controller::{ControlTuning, MaintenanceThresholds};
use crate::domain::StateVector;
use crate::profile::ProfileSelection;
use crate::repo::events::DEFAULT_KEEP_LAST;
use crate::simulation::{ClockConfig, ControlMode, EnvironmentTuning, RandomFaultInjector};

pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "GREENHOUSE__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub simulation: SimulationConfig,
    pub profile: ProfileSelection,
    #[validate(nested)]
    pub control: ControlTuning,
    #[validate(nested)]
    pub environment: EnvironmentTuning,
    #[validate(nested)]
    pub maintenance: MaintenanceThresholds,
    #[validate(nested)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_tick_interval"))]
#[serde(default)]
pub struct SimulationConfig {
    /// Real seconds between ticks
    #[validate(range(min = 0.2))]
    pub tick_interval_secs: f64,
    #[validate(nested)]
    pub clock: ClockConfig,
    /// Fixed seed for reproducible runs; entropy when unset
    pub seed: Option<u64>,
    #[validate(nested)]
    pub random_faults: RandomFaultInjector,
    pub initial_state: StateVector,
    pub mode: ControlMode,
    pub rain_forecast: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1.0,
            clock: ClockConfig::default(),
            seed: None,
            random_faults: RandomFaultInjector::default(),
            initial_state: StateVector::default(),
            mode: ControlMode::Auto,
            rain_forecast: false,
        }
    }
}

fn validate_tick_interval(sim: &SimulationConfig) -> Result<(), ValidationError> {
    if !sim.tick_interval_secs.is_finite() {
        return Err(ValidationError::new("tick_interval_not_finite"));
    }
    Ok(())
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(self.tick_interval_secs.max(0.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StorageConfig {
    #[validate(range(min = 1))]
    pub event_log_keep_last: usize,
    /// Append every event line to this file as well
    pub event_log_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            event_log_keep_last: DEFAULT_KEEP_LAST,
            event_log_path: None,
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `GREENHOUSE__*` variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }
}
