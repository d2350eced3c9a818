use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Physical envelope of the enclosure, °C
pub const TEMPERATURE_RANGE_C: RangeInclusive<f64> = -20.0..=60.0;
/// Relative humidity, %
pub const HUMIDITY_RANGE_PCT: RangeInclusive<f64> = 0.0..=100.0;
/// Illuminance, lux
pub const LIGHT_RANGE_LUX: RangeInclusive<f64> = 0.0..=2500.0;
/// Volumetric soil moisture, %
pub const SOIL_RANGE_PCT: RangeInclusive<f64> = 0.0..=100.0;
/// Rain indicator, mm
pub const RAIN_RANGE_MM: RangeInclusive<f64> = 0.0..=20.0;

/// Clamp `value` into an inclusive range. NaN collapses to the lower bound.
pub fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    if value.is_nan() {
        return *range.start();
    }
    value.clamp(*range.start(), *range.end())
}

/// Linear interpolation between `a` and `b`
pub fn lerp(a: f64, b: f64, k: f64) -> f64 {
    a + (b - a) * k
}

/// Physical state of the growing environment at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Air temperature in °C
    pub temperature_c: f64,
    /// Relative humidity in %
    pub humidity_pct: f64,
    /// Illuminance in lux
    pub light_lux: f64,
    /// Soil moisture in %
    pub soil_moisture_pct: f64,
    /// Rain indicator in mm
    pub rain_mm: f64,
}

impl Default for StateVector {
    fn default() -> Self {
        Self {
            temperature_c: 22.0,
            humidity_pct: 55.0,
            light_lux: 350.0,
            soil_moisture_pct: 45.0,
            rain_mm: 0.0,
        }
    }
}

impl StateVector {
    /// Copy of this state with every field forced into its physical range
    pub fn clamped(self) -> Self {
        Self {
            temperature_c: clamp_to(self.temperature_c, &TEMPERATURE_RANGE_C),
            humidity_pct: clamp_to(self.humidity_pct, &HUMIDITY_RANGE_PCT),
            light_lux: clamp_to(self.light_lux, &LIGHT_RANGE_LUX),
            soil_moisture_pct: clamp_to(self.soil_moisture_pct, &SOIL_RANGE_PCT),
            rain_mm: clamp_to(self.rain_mm, &RAIN_RANGE_MM),
        }
    }

    /// True when every field lies inside its physical range
    pub fn is_within_envelope(&self) -> bool {
        TEMPERATURE_RANGE_C.contains(&self.temperature_c)
            && HUMIDITY_RANGE_PCT.contains(&self.humidity_pct)
            && LIGHT_RANGE_LUX.contains(&self.light_lux)
            && SOIL_RANGE_PCT.contains(&self.soil_moisture_pct)
            && RAIN_RANGE_MM.contains(&self.rain_mm)
    }
}

/// Setpoints derived each tick from the active plant and day/night state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub temp_target_c: f64,
    pub humidity_target_pct: f64,
    pub light_min_lux: f64,
    pub soil_min_pct: f64,
}
