//! # Climate Profiles
//!
//! Static lookup tables consumed by the controller and the environment model:
//!
//! - **Outside baselines**: (city, season) → outside temperature / humidity
//! - **Sun windows**: season → sunrise / sunset hour
//! - **Plants**: plant code → day/night temperature, humidity, light and soil setpoints
//! - **Night window**: which hours count as night for targets and control policy
//!
//! Tables are built once at startup and shared by reference. Lookups never
//! fail: unknown codes fall back to a documented default.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::domain::Targets;

/// Outside baseline used for any city missing from the table
pub const FALLBACK_BASELINE: OutsideBaseline = OutsideBaseline {
    temperature_c: 10.0,
    humidity_pct: 65.0,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("Unknown city code: {0}")]
    UnknownCity(String),
    #[error("Unknown plant code: {0}")]
    UnknownPlant(String),
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Season {
    #[default]
    Winter,
    Spring,
    Summer,
    Fall,
}

/// Outside climate reference the enclosure drifts toward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutsideBaseline {
    pub temperature_c: f64,
    pub humidity_pct: f64,
}

/// Daylight hours for a season, in fractional hours of day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunWindow {
    pub sunrise_h: f64,
    pub sunset_h: f64,
}

impl SunWindow {
    pub fn for_season(season: Season) -> Self {
        let (sunrise_h, sunset_h) = match season {
            Season::Winter => (7.5, 17.0),
            Season::Spring => (6.5, 19.5),
            Season::Summer => (5.75, 20.75),
            Season::Fall => (7.0, 18.5),
        };
        Self { sunrise_h, sunset_h }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityClimate {
    pub code: String,
    pub winter: OutsideBaseline,
    pub spring: OutsideBaseline,
    pub summer: OutsideBaseline,
    pub fall: OutsideBaseline,
}

impl CityClimate {
    fn new(code: &str, table: [(f64, f64); 4]) -> Self {
        let b = |(temperature_c, humidity_pct): (f64, f64)| OutsideBaseline {
            temperature_c,
            humidity_pct,
        };
        Self {
            code: code.to_string(),
            winter: b(table[0]),
            spring: b(table[1]),
            summer: b(table[2]),
            fall: b(table[3]),
        }
    }

    pub fn baseline(&self, season: Season) -> OutsideBaseline {
        match season {
            Season::Winter => self.winter,
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Fall => self.fall,
        }
    }
}

/// Setpoints for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantProfile {
    pub code: String,
    pub label: String,
    pub temp_day_c: f64,
    pub temp_night_c: f64,
    pub humidity_pct: f64,
    pub light_min_lux: f64,
    pub soil_min_pct: f64,
}

impl PlantProfile {
    fn new(code: &str, label: &str, row: [f64; 5]) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            temp_day_c: row[0],
            temp_night_c: row[1],
            humidity_pct: row[2],
            light_min_lux: row[3],
            soil_min_pct: row[4],
        }
    }

    fn tomato() -> Self {
        Self::new("TOMATO", "Tomatoes", [24.0, 18.0, 60.0, 250.0, 45.0])
    }

    /// Targets for this plant given the day/night state
    pub fn targets(&self, night: bool) -> Targets {
        Targets {
            temp_target_c: if night { self.temp_night_c } else { self.temp_day_c },
            humidity_target_pct: self.humidity_pct,
            light_min_lux: self.light_min_lux,
            soil_min_pct: self.soil_min_pct,
        }
    }
}

/// Hours counted as night: `hour >= start_hour || hour < end_hour`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            start_hour: 20,
            end_hour: 6,
        }
    }
}

impl NightWindow {
    pub fn is_night(&self, now: NaiveDateTime) -> bool {
        let hour = now.hour();
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }
}

/// Active (city, season, plant) selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSelection {
    pub city: String,
    pub season: Season,
    pub plant: String,
}

impl Default for ProfileSelection {
    fn default() -> Self {
        Self {
            city: "Ruse".to_string(),
            season: Season::Winter,
            plant: "TOMATO".to_string(),
        }
    }
}

/// Immutable lookup data for ambient baselines and plant setpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateProfile {
    pub cities: Vec<CityClimate>,
    pub plants: Vec<PlantProfile>,
}

impl Default for ClimateProfile {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ClimateProfile {
    /// Built-in tables for five Bulgarian cities and seven crops
    pub fn builtin() -> Self {
        let cities = vec![
            CityClimate::new("Ruse", [(1.5, 75.0), (15.0, 65.0), (33.0, 50.0), (16.0, 65.0)]),
            CityClimate::new("Varna", [(5.5, 78.0), (16.0, 70.0), (30.0, 55.0), (18.0, 70.0)]),
            CityClimate::new("Burgas", [(5.5, 80.0), (16.0, 70.0), (31.0, 55.0), (18.0, 70.0)]),
            CityClimate::new("Sofia", [(0.5, 70.0), (14.0, 60.0), (32.0, 45.0), (15.0, 60.0)]),
            CityClimate::new("Plovdiv", [(3.0, 70.0), (16.0, 60.0), (35.0, 45.0), (17.0, 60.0)]),
        ];

        let plants = vec![
            PlantProfile::tomato(),
            PlantProfile::new("CUCUMBER", "Cucumbers", [25.0, 19.0, 70.0, 250.0, 50.0]),
            PlantProfile::new("PEPPER", "Pepper", [24.0, 18.0, 60.0, 250.0, 40.0]),
            PlantProfile::new("LETTUCE", "Lettuce", [18.0, 12.0, 65.0, 200.0, 50.0]),
            PlantProfile::new("STRAWBERRY", "Strawberries", [20.0, 14.0, 65.0, 220.0, 45.0]),
            PlantProfile::new("BASIL", "Basil", [23.0, 17.0, 55.0, 250.0, 40.0]),
            PlantProfile::new("SPINACH", "Spinach", [18.0, 12.0, 65.0, 200.0, 50.0]),
        ];

        Self { cities, plants }
    }

    /// Outside baseline for a city and season, falling back to
    /// [`FALLBACK_BASELINE`] for unknown cities
    pub fn outside_baseline(&self, city: &str, season: Season) -> OutsideBaseline {
        self.cities
            .iter()
            .find(|c| c.code == city)
            .map(|c| c.baseline(season))
            .unwrap_or(FALLBACK_BASELINE)
    }

    /// Plant by code; unknown codes resolve to the first plant in the table
    pub fn plant(&self, code: &str) -> Option<&PlantProfile> {
        self.plants
            .iter()
            .find(|p| p.code == code)
            .or_else(|| self.plants.first())
    }

    /// Targets for a plant code. An empty plant table yields tomato setpoints.
    pub fn targets(&self, plant: &str, night: bool) -> Targets {
        self.plant(plant).map_or_else(
            || PlantProfile::tomato().targets(night),
            |p| p.targets(night),
        )
    }

    /// Check a selection against the tables. Callers may still run with an
    /// unknown selection; the lookups fall back.
    pub fn check_selection(&self, selection: &ProfileSelection) -> Result<(), ProfileError> {
        if !self.cities.iter().any(|c| c.code == selection.city) {
            return Err(ProfileError::UnknownCity(selection.city.clone()));
        }
        if !self.plants.iter().any(|p| p.code == selection.plant) {
            return Err(ProfileError::UnknownPlant(selection.plant.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn at_hour(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[rstest]
    #[case("Ruse", Season::Winter, 1.5, 75.0)]
    #[case("Plovdiv", Season::Summer, 35.0, 45.0)]
    #[case("Varna", Season::Fall, 18.0, 70.0)]
    #[case("Atlantis", Season::Spring, 10.0, 65.0)]
    fn test_outside_baseline_lookup(
        #[case] city: &str,
        #[case] season: Season,
        #[case] temp: f64,
        #[case] hum: f64,
    ) {
        let profile = ClimateProfile::builtin();
        let baseline = profile.outside_baseline(city, season);
        assert_eq!(baseline.temperature_c, temp);
        assert_eq!(baseline.humidity_pct, hum);
    }

    #[rstest]
    #[case(2, true)]
    #[case(5, true)]
    #[case(6, false)]
    #[case(19, false)]
    #[case(20, true)]
    #[case(23, true)]
    fn test_default_night_window(#[case] hour: u32, #[case] night: bool) {
        assert_eq!(NightWindow::default().is_night(at_hour(hour)), night);
    }

    #[test]
    fn test_non_wrapping_night_window() {
        let window = NightWindow {
            start_hour: 0,
            end_hour: 5,
        };
        assert!(window.is_night(at_hour(3)));
        assert!(!window.is_night(at_hour(5)));
    }

    #[test]
    fn test_targets_switch_at_night() {
        let profile = ClimateProfile::builtin();
        let day = profile.targets("LETTUCE", false);
        let night = profile.targets("LETTUCE", true);

        assert_eq!(day.temp_target_c, 18.0);
        assert_eq!(night.temp_target_c, 12.0);
        assert_eq!(day.humidity_target_pct, 65.0);
        assert_eq!(day.light_min_lux, 200.0);
        assert_eq!(day.soil_min_pct, 50.0);
    }

    #[test]
    fn test_unknown_plant_falls_back_to_first() {
        let profile = ClimateProfile::builtin();
        assert_eq!(profile.plant("CACTUS").unwrap().code, "TOMATO");

        let empty = ClimateProfile {
            cities: Vec::new(),
            plants: Vec::new(),
        };
        assert!(empty.plant("TOMATO").is_none());
        assert_eq!(empty.targets("TOMATO", false).temp_target_c, 24.0);
    }

    #[test]
    fn test_check_selection_reports_unknown_codes() {
        let profile = ClimateProfile::builtin();
        assert!(profile.check_selection(&ProfileSelection::default()).is_ok());

        let bad_city = ProfileSelection {
            city: "Atlantis".into(),
            ..Default::default()
        };
        assert_eq!(
            profile.check_selection(&bad_city),
            Err(ProfileError::UnknownCity("Atlantis".into()))
        );

        let bad_plant = ProfileSelection {
            plant: "CACTUS".into(),
            ..Default::default()
        };
        assert_eq!(
            profile.check_selection(&bad_plant),
            Err(ProfileError::UnknownPlant("CACTUS".into()))
        );
    }

    #[test]
    fn test_sun_windows_are_ordered() {
        use strum::IntoEnumIterator;
        for season in Season::iter() {
            let sun = SunWindow::for_season(season);
            assert!(sun.sunrise_h < sun.sunset_h);
        }
    }
}
