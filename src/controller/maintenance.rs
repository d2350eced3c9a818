//! Equipment Maintenance Tracking
//!
//! Accumulates runtime hours per actuator and reports equipment that has
//! crossed its service threshold:
//! - Heating, Ventilation, Windows, Watering, Misting, Lighting
//! - Hours advance by the simulated tick length while the flag is on

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::domain::{Actuator, ActuatorFlags};

/// Service thresholds in runtime hours
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_thresholds"))]
#[serde(default)]
pub struct MaintenanceThresholds {
    #[validate(range(min = 0.0))]
    pub heating_h: f64,
    #[validate(range(min = 0.0))]
    pub ventilation_h: f64,
    #[validate(range(min = 0.0))]
    pub windows_h: f64,
    #[validate(range(min = 0.0))]
    pub watering_h: f64,
    #[validate(range(min = 0.0))]
    pub misting_h: f64,
    #[validate(range(min = 0.0))]
    pub lighting_h: f64,
}

impl Default for MaintenanceThresholds {
    fn default() -> Self {
        Self {
            heating_h: 2500.0,
            ventilation_h: 1500.0,
            windows_h: 2000.0,
            watering_h: 1200.0,
            misting_h: 1200.0,
            lighting_h: 3000.0,
        }
    }
}

// Infinity means "never service"; NaN would silently never warn
fn validate_thresholds(thresholds: &MaintenanceThresholds) -> Result<(), ValidationError> {
    let any_nan = Actuator::equipment()
        .into_iter()
        .filter_map(|a| thresholds.threshold_h(a))
        .any(f64::is_nan);
    if any_nan {
        return Err(ValidationError::new("threshold_not_a_number"));
    }
    Ok(())
}

impl MaintenanceThresholds {
    pub fn threshold_h(&self, actuator: Actuator) -> Option<f64> {
        match actuator {
            Actuator::Heating => Some(self.heating_h),
            Actuator::Ventilation => Some(self.ventilation_h),
            Actuator::Windows => Some(self.windows_h),
            Actuator::Watering => Some(self.watering_h),
            Actuator::Misting => Some(self.misting_h),
            Actuator::Lighting => Some(self.lighting_h),
            Actuator::RainProtection | Actuator::Alarm => None,
        }
    }
}

/// Equipment due for service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWarning {
    pub actuator: Actuator,
    pub runtime_h: f64,
    pub threshold_h: f64,
}

impl fmt::Display for MaintenanceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Maintenance: {} {:.0}h (thr {:.0}h)",
            self.actuator, self.runtime_h, self.threshold_h
        )
    }
}

/// Runtime-hour accumulator
#[derive(Debug, Clone)]
pub struct RuntimeTracker {
    thresholds: MaintenanceThresholds,
    runtime_h: BTreeMap<Actuator, f64>,
}

impl RuntimeTracker {
    pub fn new(thresholds: MaintenanceThresholds) -> Self {
        Self {
            thresholds,
            runtime_h: Actuator::equipment().into_iter().map(|a| (a, 0.0)).collect(),
        }
    }

    /// Add one tick of runtime to every active piece of equipment
    pub fn record(&mut self, flags: &ActuatorFlags, tick_minutes: u32) {
        let hours = f64::from(tick_minutes) / 60.0;
        for (actuator, runtime) in self.runtime_h.iter_mut() {
            if flags.get(*actuator) {
                *runtime += hours;
            }
        }
    }

    pub fn runtime_h(&self, actuator: Actuator) -> f64 {
        self.runtime_h.get(&actuator).copied().unwrap_or(0.0)
    }

    /// Equipment at or above its service threshold
    pub fn warnings(&self) -> Vec<MaintenanceWarning> {
        self.runtime_h
            .iter()
            .filter_map(|(actuator, runtime_h)| {
                let threshold_h = self.thresholds.threshold_h(*actuator)?;
                (*runtime_h >= threshold_h).then_some(MaintenanceWarning {
                    actuator: *actuator,
                    runtime_h: *runtime_h,
                    threshold_h,
                })
            })
            .collect()
    }

    /// Zero the counter after servicing
    pub fn reset(&mut self, actuator: Actuator) {
        if let Some(runtime) = self.runtime_h.get_mut(&actuator) {
            info!(actuator = %actuator, runtime_h = *runtime, "maintenance counter reset");
            *runtime = 0.0;
        }
    }
}
