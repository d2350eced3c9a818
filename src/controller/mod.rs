//! # Actuator Decision Engine
//!
//! Turns a state vector and its targets into actuator flags. Two disciplines:
//!
//! - **Heating** tracks quickly: on below `target - band`, off at `target + hysteresis`.
//! - **Ventilation, Windows, Watering, Misting, Lighting** are strict: once on,
//!   a release is honored only after the actuator's minimum on-time.
//!
//! Rain forecasts close the windows immediately and raise rain protection.
//! At night, ventilation and windows may close early once their minimum
//! on-time has passed and nothing demands ventilation.

pub mod maintenance;
pub mod timers;
pub mod tuning;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::domain::{Actuator, ActuatorFlags, Fault, FaultState, StateVector, Targets};

pub use maintenance::{MaintenanceThresholds, MaintenanceWarning, RuntimeTracker};
pub use timers::{ActivationTimer, ActivationTimers};
pub use tuning::{AlarmPolicy, ControlTuning};

/// Why a rule fired on a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reason {
    TempLow { value: f64, threshold: f64 },
    TempHigh { value: f64, threshold: f64 },
    HumidityHigh { value: f64, threshold: f64 },
    HumidityLow { value: f64, threshold: f64 },
    SoilLow { value: f64, threshold: f64 },
    LightLow { value: f64, threshold: f64 },
    RainForecast,
    Fault(Fault),
    ManualMode,
}

impl Reason {
    pub fn is_fault(&self) -> bool {
        matches!(self, Reason::Fault(_))
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::TempLow { value, threshold } => {
                write!(f, "Temp low ({:.1} < {:.1})", value, threshold)
            }
            Reason::TempHigh { value, threshold } => {
                write!(f, "Temp high ({:.1} > {:.1})", value, threshold)
            }
            Reason::HumidityHigh { value, threshold } => {
                write!(f, "Humidity high ({:.1} > {:.1})", value, threshold)
            }
            Reason::HumidityLow { value, threshold } => {
                write!(f, "Humidity low ({:.1} < {:.1})", value, threshold)
            }
            Reason::SoilLow { value, threshold } => {
                write!(f, "Soil low ({:.1} < {:.1})", value, threshold)
            }
            Reason::LightLow { value, threshold } => {
                write!(f, "Light low ({:.0} < {:.0})", value, threshold)
            }
            Reason::RainForecast => write!(f, "Rain forecast -> close windows"),
            Reason::Fault(fault) => write!(f, "FAULT: {}", fault),
            Reason::ManualMode => write!(f, "Manual mode"),
        }
    }
}

/// Output of one controller evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub flags: ActuatorFlags,
    pub reasons: Vec<Reason>,
}

impl Decision {
    /// Everything off; used while the operator drives the actuators
    pub fn manual() -> Self {
        Self {
            flags: ActuatorFlags::blank(),
            reasons: vec![Reason::ManualMode],
        }
    }

    pub fn reason_lines(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

/// Stateful rule engine. Output depends on inputs and the stored
/// activation timers.
#[derive(Debug, Clone)]
pub struct ActuatorController {
    tuning: ControlTuning,
    flags: ActuatorFlags,
    timers: ActivationTimers,
}

impl ActuatorController {
    pub fn new(tuning: ControlTuning) -> Self {
        Self {
            tuning,
            flags: ActuatorFlags::blank(),
            timers: ActivationTimers::default(),
        }
    }

    pub fn tuning(&self) -> &ControlTuning {
        &self.tuning
    }

    /// Flags produced by the last evaluation
    pub fn flags(&self) -> ActuatorFlags {
        self.flags
    }

    pub fn timers(&self) -> &ActivationTimers {
        &self.timers
    }

    pub fn is_night(&self, now: NaiveDateTime) -> bool {
        self.tuning.night_window.is_night(now)
    }

    /// Drop all flags and timers
    pub fn reset(&mut self) {
        self.flags = ActuatorFlags::blank();
        self.timers.reset();
    }

    fn min_on_elapsed(&self, actuator: Actuator, now: NaiveDateTime) -> bool {
        self.timers
            .min_on_elapsed(actuator, now, self.tuning.min_on(actuator))
    }

    /// Evaluate every rule for one tick and commit the resulting flags.
    pub fn decide(
        &mut self,
        state: &StateVector,
        targets: &Targets,
        rain_forecast: bool,
        faults: &FaultState,
        now: NaiveDateTime,
    ) -> Decision {
        let tuning = &self.tuning;
        let previous = self.flags;
        let mut next = previous;
        let mut reasons = Vec::new();
        let night = tuning.night_window.is_night(now);

        let temp = state.temperature_c;
        let hum = state.humidity_pct;
        let light = state.light_lux;
        let soil = state.soil_moisture_pct;

        let temp_target = targets.temp_target_c;
        let hum_target = targets.humidity_target_pct;

        // Heating
        let heat_on_below = temp_target - tuning.temp_band_c;
        if temp < heat_on_below {
            next.heating = true;
            reasons.push(Reason::TempLow {
                value: temp,
                threshold: heat_on_below,
            });
        } else if temp >= temp_target + tuning.temp_hysteresis_c {
            next.heating = false;
        }

        // Ventilation
        let temp_high_above = temp_target + tuning.temp_band_c;
        let hum_high_above = hum_target + tuning.humidity_band_pct;
        let temp_high = temp > temp_high_above;
        let hum_high = hum > hum_high_above;
        let want_vent = temp_high || hum_high;
        let back_inside = temp <= temp_high_above - tuning.temp_hysteresis_c
            && hum <= hum_high_above - tuning.humidity_hysteresis_pct;

        if want_vent {
            next.ventilation = true;
            if temp_high {
                reasons.push(Reason::TempHigh {
                    value: temp,
                    threshold: temp_high_above,
                });
            }
            if hum_high {
                reasons.push(Reason::HumidityHigh {
                    value: hum,
                    threshold: hum_high_above,
                });
            }
        } else if back_inside && self.min_on_elapsed(Actuator::Ventilation, now) {
            next.ventilation = false;
        }

        // Windows: rain protection wins over minimum on-time
        if rain_forecast {
            next.rain_protection = true;
            next.windows = false;
            reasons.push(Reason::RainForecast);
        } else {
            next.rain_protection = false;
            if want_vent {
                next.windows = true;
            } else if back_inside && self.min_on_elapsed(Actuator::Windows, now) {
                next.windows = false;
            }
        }

        // Night: close early without waiting for the hysteresis band
        if night && !want_vent {
            if self.min_on_elapsed(Actuator::Ventilation, now) {
                next.ventilation = false;
            }
            if self.min_on_elapsed(Actuator::Windows, now) {
                next.windows = false;
            }
        }

        // Watering
        let soil_min = targets.soil_min_pct;
        if soil < soil_min {
            next.watering = true;
            reasons.push(Reason::SoilLow {
                value: soil,
                threshold: soil_min,
            });
        } else if soil >= soil_min + tuning.soil_band_pct
            && self.min_on_elapsed(Actuator::Watering, now)
        {
            next.watering = false;
        }

        // Misting
        let hum_low_below = hum_target - tuning.humidity_band_pct;
        if hum < hum_low_below {
            next.misting = true;
            reasons.push(Reason::HumidityLow {
                value: hum,
                threshold: hum_low_below,
            });
        } else if hum >= hum_low_below + tuning.humidity_hysteresis_pct
            && self.min_on_elapsed(Actuator::Misting, now)
        {
            next.misting = false;
        }

        // Lighting
        let light_min = targets.light_min_lux;
        let lighting_allowed = !night || tuning.allow_light_at_night;
        if lighting_allowed && light < light_min {
            next.lighting = true;
            reasons.push(Reason::LightLow {
                value: light,
                threshold: light_min,
            });
        } else if light >= light_min + tuning.light_band_lux
            && self.min_on_elapsed(Actuator::Lighting, now)
        {
            next.lighting = false;
        }

        // Faults are advisory only
        reasons.extend(faults.active().into_iter().map(Reason::Fault));

        next.alarm = match tuning.alarm_policy {
            AlarmPolicy::AnyReason => !reasons.is_empty(),
            AlarmPolicy::FaultsOnly => reasons.iter().any(Reason::is_fault),
        };

        for (actuator, on) in self.timers.record_transitions(&previous, &next, now) {
            debug!(actuator = %actuator, on, %now, "actuator transition");
        }
        self.flags = next;

        Decision {
            flags: next,
            reasons,
        }
    }
}
