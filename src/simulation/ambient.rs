//! # Ambient Drivers
//!
//! Outside conditions the enclosure drifts toward: temperature and humidity
//! from the (city, season) baseline with a sinusoidal day/night swing, and
//! natural light from a day arc between seasonal sunrise and sunset.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::domain::{clamp_to, lerp};
use crate::profile::{ClimateProfile, Season, SunWindow};

/// Diurnal temperature amplitude, °C
const TEMP_SWING_C: f64 = 3.2;
/// Diurnal humidity amplitude, %RH (inverse to temperature)
const HUMIDITY_SWING_PCT: f64 = 7.0;
const OUTSIDE_HUMIDITY_RANGE: std::ops::RangeInclusive<f64> = 25.0..=95.0;

const NATURAL_LIGHT_DAY_RANGE: (f64, f64) = (500.0, 650.0);
const NATURAL_LIGHT_NIGHT_RANGE: (f64, f64) = (120.0, 200.0);
/// Light at sunrise/sunset edges of the day arc
const NATURAL_LIGHT_DAWN_LUX: f64 = 260.0;

/// Outside drivers for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientDrivers {
    pub outside_temp_c: f64,
    pub outside_humidity_pct: f64,
    pub natural_light_lux: f64,
}

/// Fractional hour of day
pub fn hour_of_day(t: NaiveDateTime) -> f64 {
    f64::from(t.hour()) + f64::from(t.minute()) / 60.0 + f64::from(t.second()) / 3600.0
}

/// Outside temperature and humidity at `now`
pub fn outside_conditions(
    profile: &ClimateProfile,
    city: &str,
    season: Season,
    now: NaiveDateTime,
) -> (f64, f64) {
    let base = profile.outside_baseline(city, season);
    let swing = ((hour_of_day(now) - 6.0) / 24.0 * 2.0 * PI).sin();
    let temp = base.temperature_c + TEMP_SWING_C * swing;
    let humidity = clamp_to(
        base.humidity_pct - HUMIDITY_SWING_PCT * swing,
        &OUTSIDE_HUMIDITY_RANGE,
    );
    (temp, humidity)
}

/// Natural light at `now`: flat at night, a half-sine arc across the day
pub fn natural_light_lux(season: Season, now: NaiveDateTime) -> f64 {
    let sun = SunWindow::for_season(season);
    let h = hour_of_day(now);
    if h < sun.sunrise_h || h > sun.sunset_h {
        return lerp(NATURAL_LIGHT_NIGHT_RANGE.0, NATURAL_LIGHT_NIGHT_RANGE.1, 0.5);
    }

    let day_len = (sun.sunset_h - sun.sunrise_h).max(0.1);
    let x = (h - sun.sunrise_h) / day_len;
    let arc = (PI * x).sin();
    let peak = lerp(NATURAL_LIGHT_DAY_RANGE.0, NATURAL_LIGHT_DAY_RANGE.1, 0.75);
    lerp(NATURAL_LIGHT_DAWN_LUX, peak, arc)
}

/// Baseline drivers before any anomaly modifier
pub fn baseline_drivers(
    profile: &ClimateProfile,
    city: &str,
    season: Season,
    now: NaiveDateTime,
) -> AmbientDrivers {
    let (outside_temp_c, outside_humidity_pct) = outside_conditions(profile, city, season, now);
    AmbientDrivers {
        outside_temp_c,
        outside_humidity_pct,
        natural_light_lux: natural_light_lux(season, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_outside_swing_peaks_mid_day() {
        let profile = ClimateProfile::builtin();
        let (noon, _) = outside_conditions(&profile, "Sofia", Season::Summer, at(12, 0));
        let (six, hum_six) = outside_conditions(&profile, "Sofia", Season::Summer, at(6, 0));
        let (midnight, _) = outside_conditions(&profile, "Sofia", Season::Summer, at(0, 0));

        assert!((noon - 35.2).abs() < 1e-9);
        assert!((six - 32.0).abs() < 1e-9);
        assert!((hum_six - 45.0).abs() < 1e-9);
        assert!((midnight - 28.8).abs() < 1e-9);
    }

    #[test]
    fn test_outside_humidity_is_bounded() {
        let profile = ClimateProfile::builtin();
        for hour in 0..24 {
            let (_, hum) = outside_conditions(&profile, "Burgas", Season::Winter, at(hour, 0));
            assert!((25.0..=95.0).contains(&hum));
        }
    }

    #[test]
    fn test_unknown_city_uses_fallback_baseline() {
        let profile = ClimateProfile::builtin();
        let (temp, hum) = outside_conditions(&profile, "Nowhere", Season::Summer, at(6, 0));
        assert!((temp - 10.0).abs() < 1e-9);
        assert!((hum - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_natural_light_day_arc() {
        assert_eq!(natural_light_lux(Season::Winter, at(2, 0)), 160.0);
        assert_eq!(natural_light_lux(Season::Winter, at(18, 0)), 160.0);

        // Winter sun window 7.5 - 17.0, midpoint 12:15
        let peak = natural_light_lux(Season::Winter, at(12, 15));
        assert!((peak - 612.5).abs() < 1e-9);

        let morning = natural_light_lux(Season::Winter, at(8, 0));
        assert!(morning > 260.0 && morning < peak);
    }
}
