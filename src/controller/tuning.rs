use chrono::Duration;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::Actuator;
use crate::profile::NightWindow;

/// When the Alarm flag is raised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmPolicy {
    /// Alarm whenever any rule fired this tick, routine actuation included
    #[default]
    AnyReason,
    /// Alarm only when an equipment fault is reported
    FaultsOnly,
}

/// Bands, hysteresis widths and minimum-on durations for the decision engine
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_bands"))]
#[serde(default)]
pub struct ControlTuning {
    /// Heating triggers below `target - temp_band_c`; ventilation above `target + temp_band_c`
    #[validate(range(min = 0.0))]
    pub temp_band_c: f64,
    #[validate(range(min = 0.0))]
    pub humidity_band_pct: f64,
    #[validate(range(min = 0.0))]
    pub soil_band_pct: f64,
    #[validate(range(min = 0.0))]
    pub light_band_lux: f64,

    #[validate(range(min = 0.0))]
    pub temp_hysteresis_c: f64,
    #[validate(range(min = 0.0))]
    pub humidity_hysteresis_pct: f64,

    pub min_on_ventilation_s: u32,
    pub min_on_windows_s: u32,
    pub min_on_watering_s: u32,
    pub min_on_misting_s: u32,
    pub min_on_lighting_s: u32,

    /// Permit supplemental lighting during the night window
    pub allow_light_at_night: bool,
    pub alarm_policy: AlarmPolicy,
    pub night_window: NightWindow,
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            temp_band_c: 2.0,
            humidity_band_pct: 6.0,
            soil_band_pct: 2.5,
            light_band_lux: 60.0,
            temp_hysteresis_c: 0.7,
            humidity_hysteresis_pct: 3.0,
            min_on_ventilation_s: 15 * 60,
            min_on_windows_s: 15 * 60,
            min_on_watering_s: 12 * 60,
            min_on_misting_s: 10 * 60,
            min_on_lighting_s: 10 * 60,
            allow_light_at_night: true,
            alarm_policy: AlarmPolicy::AnyReason,
            night_window: NightWindow::default(),
        }
    }
}

impl ControlTuning {
    /// Minimum on-time for strict actuators; zero for everything else
    pub fn min_on(&self, actuator: Actuator) -> Duration {
        let seconds = match actuator {
            Actuator::Ventilation => self.min_on_ventilation_s,
            Actuator::Windows => self.min_on_windows_s,
            Actuator::Watering => self.min_on_watering_s,
            Actuator::Misting => self.min_on_misting_s,
            Actuator::Lighting => self.min_on_lighting_s,
            Actuator::Heating | Actuator::RainProtection | Actuator::Alarm => 0,
        };
        Duration::seconds(i64::from(seconds))
    }
}

fn validate_bands(tuning: &ControlTuning) -> Result<(), ValidationError> {
    let widths = [
        tuning.temp_band_c,
        tuning.humidity_band_pct,
        tuning.soil_band_pct,
        tuning.light_band_lux,
        tuning.temp_hysteresis_c,
        tuning.humidity_hysteresis_pct,
    ];
    if widths.iter().any(|w| !w.is_finite()) {
        return Err(ValidationError::new("band_not_finite"));
    }
    if tuning.temp_band_c <= tuning.temp_hysteresis_c {
        return Err(ValidationError::new("temp_band_must_exceed_hysteresis"));
    }
    if tuning.humidity_band_pct <= tuning.humidity_hysteresis_pct {
        return Err(ValidationError::new("humidity_band_must_exceed_hysteresis"));
    }
    if tuning.night_window.start_hour > 23 || tuning.night_window.end_hour > 23 {
        return Err(ValidationError::new("night_window_hour_out_of_range"));
    }
    Ok(())
}
