//! # Environment Model
//!
//! Advances the five-value state vector by one tick. Per tick:
//!
//! 1. Ambient drivers (outside temperature/humidity, natural light)
//! 2. Anomaly modifiers, with auto-expiry
//! 3. Leak toward ambient (imperfect insulation)
//! 4. Night temperature floor
//! 5. Actuator effects, degraded by faults
//! 6. Bounded noise from the injected random source
//! 7. Clamp to the physical envelope
//!
//! All rates are per simulated hour and scale with the tick length.

use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::ambient::{baseline_drivers, AmbientDrivers};
use crate::domain::{
    lerp, Actuator, ActuatorFlags, Anomaly, AnomalyState, Fault, FaultState, StateVector,
};
use crate::profile::{ClimateProfile, NightWindow, Season};

/// Diagnostic annotations keyed by topic ("anomaly", actuator names)
pub type Notes = BTreeMap<String, String>;

/// Smallest tick the model integrates over, hours
const MIN_TICK_HOURS: f64 = 0.01;

/// Rates and constants of the enclosure physics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_finite"))]
#[serde(default)]
pub struct EnvironmentTuning {
    /// Temperature leak toward outside per hour, and cap per tick
    #[validate(range(min = 0.0, max = 1.0))]
    pub temp_leak_per_hour: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub temp_leak_cap: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub humidity_leak_per_hour: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub humidity_leak_cap: f64,
    /// Convergence of indoor light toward natural light
    #[validate(range(min = 0.0, max = 1.0))]
    pub light_leak_per_hour: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub light_leak_cap: f64,
    /// Soil evaporation as a fraction of (soil - residual) per hour
    #[validate(range(min = 0.0))]
    pub soil_dry_per_hour: f64,
    pub soil_residual_pct: f64,

    pub min_night_temp_c: f64,

    #[validate(range(min = 0.0))]
    pub heating_rate_c_per_hour: f64,
    #[validate(range(min = 0.0))]
    pub heating_cap_c_per_tick: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub ventilation_efficiency: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub windows_efficiency: f64,
    #[validate(range(min = 0.0))]
    pub vent_leak_mult: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub vent_cap: f64,
    #[validate(range(min = 0.0))]
    pub watering_soil_pct_per_hour: f64,
    #[validate(range(min = 0.0))]
    pub watering_humidity_pct_per_hour: f64,
    #[validate(range(min = 0.0))]
    pub misting_humidity_pct_per_hour: f64,
    #[validate(range(min = 0.0))]
    pub misting_cooling_c_per_hour: f64,
    pub lamp_target_lux: f64,
    /// Lamp convergence per quarter hour
    #[validate(range(min = 0.0, max = 1.0))]
    pub lamp_rate_per_quarter_hour: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub lamp_cap: f64,

    /// Effectiveness multiplier of a faulted fan, pump or mister
    #[validate(range(min = 0.0, max = 1.0))]
    pub fault_effectiveness: f64,

    #[validate(range(min = 0.0, max = 20.0))]
    pub rain_mm_when_forecast: f64,

    pub noise_enabled: bool,
    #[validate(range(min = 0.0))]
    pub noise_temp_c_per_hour: f64,
    #[validate(range(min = 0.0))]
    pub noise_humidity_pct_per_hour: f64,
    #[validate(range(min = 0.0))]
    pub noise_light_lux_per_hour: f64,
    #[validate(range(min = 0.0))]
    pub noise_soil_pct_per_hour: f64,
}

impl Default for EnvironmentTuning {
    fn default() -> Self {
        Self {
            temp_leak_per_hour: 0.06,
            temp_leak_cap: 0.12,
            humidity_leak_per_hour: 0.04,
            humidity_leak_cap: 0.10,
            light_leak_per_hour: 0.65,
            light_leak_cap: 0.85,
            soil_dry_per_hour: 0.015,
            soil_residual_pct: 0.8,
            min_night_temp_c: 8.0,
            heating_rate_c_per_hour: 4.0,
            heating_cap_c_per_tick: 6.0,
            ventilation_efficiency: 0.40,
            windows_efficiency: 0.55,
            vent_leak_mult: 0.55,
            vent_cap: 0.75,
            watering_soil_pct_per_hour: 6.0,
            watering_humidity_pct_per_hour: 0.8,
            misting_humidity_pct_per_hour: 7.0,
            misting_cooling_c_per_hour: 0.25,
            lamp_target_lux: lerp(450.0, 520.0, 0.6),
            lamp_rate_per_quarter_hour: 0.35,
            lamp_cap: 0.7,
            fault_effectiveness: 0.25,
            rain_mm_when_forecast: 3.5,
            noise_enabled: true,
            noise_temp_c_per_hour: 0.4,
            noise_humidity_pct_per_hour: 1.0,
            noise_light_lux_per_hour: 20.0,
            noise_soil_pct_per_hour: 0.2,
        }
    }
}

impl EnvironmentTuning {
    /// Same physics without random noise, for reproducible trajectories
    pub fn noiseless() -> Self {
        Self {
            noise_enabled: false,
            ..Default::default()
        }
    }

    fn constants(&self) -> [(&'static str, f64); 28] {
        [
            ("temp_leak_per_hour", self.temp_leak_per_hour),
            ("temp_leak_cap", self.temp_leak_cap),
            ("humidity_leak_per_hour", self.humidity_leak_per_hour),
            ("humidity_leak_cap", self.humidity_leak_cap),
            ("light_leak_per_hour", self.light_leak_per_hour),
            ("light_leak_cap", self.light_leak_cap),
            ("soil_dry_per_hour", self.soil_dry_per_hour),
            ("soil_residual_pct", self.soil_residual_pct),
            ("min_night_temp_c", self.min_night_temp_c),
            ("heating_rate_c_per_hour", self.heating_rate_c_per_hour),
            ("heating_cap_c_per_tick", self.heating_cap_c_per_tick),
            ("ventilation_efficiency", self.ventilation_efficiency),
            ("windows_efficiency", self.windows_efficiency),
            ("vent_leak_mult", self.vent_leak_mult),
            ("vent_cap", self.vent_cap),
            ("watering_soil_pct_per_hour", self.watering_soil_pct_per_hour),
            ("watering_humidity_pct_per_hour", self.watering_humidity_pct_per_hour),
            ("misting_humidity_pct_per_hour", self.misting_humidity_pct_per_hour),
            ("misting_cooling_c_per_hour", self.misting_cooling_c_per_hour),
            ("lamp_target_lux", self.lamp_target_lux),
            ("lamp_rate_per_quarter_hour", self.lamp_rate_per_quarter_hour),
            ("lamp_cap", self.lamp_cap),
            ("fault_effectiveness", self.fault_effectiveness),
            ("rain_mm_when_forecast", self.rain_mm_when_forecast),
            ("noise_temp_c_per_hour", self.noise_temp_c_per_hour),
            ("noise_humidity_pct_per_hour", self.noise_humidity_pct_per_hour),
            ("noise_light_lux_per_hour", self.noise_light_lux_per_hour),
            ("noise_soil_pct_per_hour", self.noise_soil_pct_per_hour),
        ]
    }
}

// `range` lets NaN through, and a NaN cap would panic in `f64::clamp`
fn validate_finite(tuning: &EnvironmentTuning) -> Result<(), ValidationError> {
    for (name, value) in tuning.constants() {
        if !value.is_finite() {
            let mut err = ValidationError::new("not_finite");
            err.add_param(Cow::Borrowed("field"), &name);
            return Err(err);
        }
    }
    Ok(())
}

/// Humidity bounds applied by the watering/misting paths
const ACTUATED_HUMIDITY_RANGE: std::ops::RangeInclusive<f64> = 5.0..=98.0;

fn approach(value: f64, target: f64, k: f64) -> f64 {
    value + (target - value) * k
}

/// Physical environment of the enclosure. Owns the fault flags and the
/// active anomaly.
#[derive(Debug, Clone)]
pub struct EnvironmentModel {
    profile: Arc<ClimateProfile>,
    tuning: EnvironmentTuning,
    night_window: NightWindow,
    faults: FaultState,
    /// Flags raised by the active fault anomaly and not set before it
    anomaly_faults: FaultState,
    anomaly: AnomalyState,
}

impl EnvironmentModel {
    pub fn new(profile: Arc<ClimateProfile>, tuning: EnvironmentTuning) -> Self {
        Self {
            profile,
            tuning,
            night_window: NightWindow::default(),
            faults: FaultState::default(),
            anomaly_faults: FaultState::default(),
            anomaly: AnomalyState::default(),
        }
    }

    /// Use the controller's night window for the temperature floor
    pub fn with_night_window(mut self, night_window: NightWindow) -> Self {
        self.night_window = night_window;
        self
    }

    pub fn tuning(&self) -> &EnvironmentTuning {
        &self.tuning
    }

    pub fn night_window(&self) -> NightWindow {
        self.night_window
    }

    pub fn faults(&self) -> FaultState {
        self.faults
    }

    pub fn anomaly(&self) -> AnomalyState {
        self.anomaly
    }

    /// Anomaly in effect at `now`
    pub fn active_anomaly(&self, now: NaiveDateTime) -> Anomaly {
        self.anomaly.current(now)
    }

    /// Start an anomaly, replacing any active one
    pub fn set_anomaly(&mut self, anomaly: Anomaly, now: NaiveDateTime, duration: Duration) {
        self.clear_anomaly();
        if anomaly == Anomaly::Normal {
            return;
        }
        self.anomaly.set(anomaly, now, duration);
        info!(anomaly = %anomaly, expires_at = %(now + duration), "anomaly set");
    }

    pub fn clear_anomaly(&mut self) {
        if let Some(cleared) = self.anomaly.clear() {
            self.release_anomaly_fault(cleared);
            info!(anomaly = %cleared, "anomaly cleared");
        }
    }

    pub fn inject_fault(&mut self, fault: Fault) {
        if !self.faults.get(fault) {
            info!(fault = %fault, "fault injected");
        }
        self.faults.set(fault, true);
        // Outlives the anomaly that may have raised it
        self.anomaly_faults.set(fault, false);
    }

    /// Manual reset of every fault flag
    pub fn reset_faults(&mut self) {
        self.faults.reset();
        self.anomaly_faults.reset();
        info!("faults reset");
    }

    fn release_anomaly_fault(&mut self, anomaly: Anomaly) {
        if let Some(fault) = anomaly.fault() {
            if self.anomaly_faults.get(fault) {
                self.faults.set(fault, false);
                self.anomaly_faults.set(fault, false);
            }
        }
    }

    /// Ambient drivers at `now` with the active anomaly's modifier applied
    pub fn ambient(&self, city: &str, season: Season, now: NaiveDateTime) -> AmbientDrivers {
        let mut drivers = baseline_drivers(&self.profile, city, season, now);
        match self.anomaly.current(now) {
            Anomaly::LowLight => drivers.natural_light_lux *= 0.45,
            Anomaly::HeatWave => drivers.outside_temp_c += 8.0,
            Anomaly::ColdSnap => drivers.outside_temp_c -= 10.0,
            _ => {}
        }
        drivers
    }

    /// Evolve the state by one tick under the given actuator flags.
    #[allow(clippy::too_many_arguments)]
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        state: &StateVector,
        flags: &ActuatorFlags,
        city: &str,
        season: Season,
        now: NaiveDateTime,
        tick_minutes: u32,
        rain_forecast: bool,
        rng: &mut R,
    ) -> (StateVector, Notes) {
        let hours = (f64::from(tick_minutes) / 60.0).max(MIN_TICK_HOURS);
        let mut notes = Notes::new();

        if let Some(expired) = self.anomaly.expire(now) {
            self.release_anomaly_fault(expired);
            info!(anomaly = %expired, %now, "anomaly expired");
        }

        let drivers = self.ambient(city, season, now);
        let tuning = &self.tuning;

        let mut temp = state.temperature_c;
        let mut hum = state.humidity_pct;
        let mut lux = state.light_lux;
        let mut soil = state.soil_moisture_pct;
        let mut rain = if rain_forecast {
            tuning.rain_mm_when_forecast
        } else {
            0.0
        };

        // Anomalies acting on the state rather than the drivers
        let anomaly = self.anomaly.current(now);
        match anomaly {
            Anomaly::Normal => {}
            Anomaly::DryAir => {
                hum = approach(hum, 28.0, (0.30 * hours).clamp(0.0, 0.6));
                notes.insert("anomaly".into(), "Dry air event".into());
            }
            Anomaly::HumidAir => {
                hum = approach(hum, 85.0, (0.22 * hours).clamp(0.0, 0.5));
                notes.insert("anomaly".into(), "Humid air event".into());
            }
            Anomaly::LowLight => {
                notes.insert("anomaly".into(), "Low light (clouds)".into());
            }
            Anomaly::HeatWave => {
                notes.insert("anomaly".into(), "Heat wave".into());
            }
            Anomaly::ColdSnap => {
                notes.insert("anomaly".into(), "Cold snap".into());
            }
            Anomaly::DrySoil => {
                soil = approach(soil, 22.0, (0.22 * hours).clamp(0.0, 0.5));
                notes.insert("anomaly".into(), "Dry soil event".into());
            }
            Anomaly::RainForecast => {
                rain = tuning.rain_mm_when_forecast;
                notes.insert("anomaly".into(), "Storm forecast".into());
            }
            Anomaly::FanFault | Anomaly::PumpFault | Anomaly::MisterFault => {
                if let Some(fault) = anomaly.fault() {
                    if !self.faults.get(fault) {
                        self.faults.set(fault, true);
                        self.anomaly_faults.set(fault, true);
                    }
                }
                notes.insert("anomaly".into(), format!("{} injected", anomaly.label()));
            }
        }
        let faults = self.faults;

        // Leak toward ambient
        temp = approach(
            temp,
            drivers.outside_temp_c,
            (tuning.temp_leak_per_hour * hours).clamp(0.0, tuning.temp_leak_cap),
        );
        hum = approach(
            hum,
            drivers.outside_humidity_pct,
            (tuning.humidity_leak_per_hour * hours).clamp(0.0, tuning.humidity_leak_cap),
        );

        let night = self.night_window.is_night(now);
        if night {
            temp = temp.max(tuning.min_night_temp_c);
        }

        lux = approach(
            lux,
            drivers.natural_light_lux,
            (tuning.light_leak_per_hour * hours).clamp(0.0, tuning.light_leak_cap),
        );
        soil -= (soil - tuning.soil_residual_pct) * tuning.soil_dry_per_hour * hours;
        soil = soil.clamp(0.0, 100.0);

        // Actuators
        if flags.heating {
            temp += (tuning.heating_rate_c_per_hour * hours).clamp(0.0, tuning.heating_cap_c_per_tick);
            notes.insert(Actuator::Heating.to_string(), "Heating ON".into());
        }

        if flags.ventilation || flags.windows {
            let mut efficiency = if flags.windows {
                tuning.windows_efficiency
            } else {
                tuning.ventilation_efficiency
            };
            if faults.fan_fault && flags.ventilation {
                efficiency *= tuning.fault_effectiveness;
                notes.insert(
                    Actuator::Ventilation.to_string(),
                    "Fan fault reduces effect".into(),
                );
            }
            let k = (efficiency * tuning.vent_leak_mult * hours).clamp(0.0, tuning.vent_cap);
            temp = approach(temp, drivers.outside_temp_c, k);
            hum = approach(hum, drivers.outside_humidity_pct, (0.75 * k).clamp(0.0, 0.75));
        }

        if flags.watering {
            let mut inc = tuning.watering_soil_pct_per_hour * hours;
            if faults.pump_fault {
                inc *= tuning.fault_effectiveness;
                notes.insert(Actuator::Watering.to_string(), "Pump fault limits flow".into());
            }
            soil = (soil + inc).clamp(0.0, 100.0);
            hum = (hum + tuning.watering_humidity_pct_per_hour * hours)
                .clamp(*ACTUATED_HUMIDITY_RANGE.start(), *ACTUATED_HUMIDITY_RANGE.end());
        }

        if flags.misting {
            let mut inc = tuning.misting_humidity_pct_per_hour * hours;
            if faults.mister_fault {
                inc *= tuning.fault_effectiveness;
                notes.insert(Actuator::Misting.to_string(), "Mister fault limits spray".into());
            }
            hum = (hum + inc).clamp(*ACTUATED_HUMIDITY_RANGE.start(), *ACTUATED_HUMIDITY_RANGE.end());
            temp -= tuning.misting_cooling_c_per_hour * hours;
        }

        if flags.lighting {
            let k = (tuning.lamp_rate_per_quarter_hour * (hours / 0.25)).clamp(0.0, tuning.lamp_cap);
            lux = approach(lux, tuning.lamp_target_lux, k);
        }

        if tuning.noise_enabled {
            temp += symmetric_noise(rng, tuning.noise_temp_c_per_hour * hours);
            hum += symmetric_noise(rng, tuning.noise_humidity_pct_per_hour * hours);
            lux += symmetric_noise(rng, tuning.noise_light_lux_per_hour * hours);
            soil += symmetric_noise(rng, tuning.noise_soil_pct_per_hour * hours);
        }

        // Floor holds for the returned state, not just before actuation
        if night {
            temp = temp.max(tuning.min_night_temp_c);
        }

        let next = StateVector {
            temperature_c: temp,
            humidity_pct: hum,
            light_lux: lux,
            soil_moisture_pct: soil,
            rain_mm: rain,
        }
        .clamped();

        (next, notes)
    }
}

/// Uniform sample in `[-amplitude, amplitude]`; zero for a non-positive amplitude
fn symmetric_noise<R: Rng + ?Sized>(rng: &mut R, amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        rng.gen_range(-amplitude..=amplitude)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn model() -> EnvironmentModel {
        EnvironmentModel::new(Arc::new(ClimateProfile::builtin()), EnvironmentTuning::noiseless())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn mild() -> StateVector {
        StateVector {
            temperature_c: 20.0,
            humidity_pct: 60.0,
            light_lux: 300.0,
            soil_moisture_pct: 40.0,
            rain_mm: 0.0,
        }
    }

    #[test]
    fn test_leak_pulls_toward_outside() {
        let mut env = model();
        let flags = ActuatorFlags::blank();

        let (next, notes) =
            env.advance(&mild(), &flags, "Ruse", Season::Winter, at(12, 0), 60, false, &mut rng());

        // Ruse winter at noon is 4.7 °C outside
        let expected = 20.0 + (4.7 - 20.0) * 0.06;
        assert!((next.temperature_c - expected).abs() < 1e-9);
        assert!(next.soil_moisture_pct < 40.0);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_heating_adds_rate_times_hours() {
        let mut env = model();
        let mut flags = ActuatorFlags::blank();
        let (baseline, _) =
            env.advance(&mild(), &flags, "Ruse", Season::Winter, at(12, 0), 15, false, &mut rng());

        flags.heating = true;
        let (heated, notes) =
            env.advance(&mild(), &flags, "Ruse", Season::Winter, at(12, 0), 15, false, &mut rng());

        assert!((heated.temperature_c - baseline.temperature_c - 1.0).abs() < 1e-9);
        assert_eq!(notes.get("Heating").map(String::as_str), Some("Heating ON"));
    }

    #[test]
    fn test_heating_capped_per_tick() {
        let mut env = model();
        let mut flags = ActuatorFlags::blank();
        let (baseline, _) =
            env.advance(&mild(), &flags, "Atlantis", Season::Fall, at(12, 0), 180, false, &mut rng());
        flags.heating = true;
        let (heated, _) =
            env.advance(&mild(), &flags, "Atlantis", Season::Fall, at(12, 0), 180, false, &mut rng());

        assert!((heated.temperature_c - baseline.temperature_c - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_fan_fault_weakens_ventilation_only() {
        let mut hot = mild();
        hot.temperature_c = 35.0;
        let mut flags = ActuatorFlags::blank();
        flags.ventilation = true;

        let mut healthy = model();
        let (cooled, _) =
            healthy.advance(&hot, &flags, "Ruse", Season::Winter, at(12, 0), 60, false, &mut rng());

        let mut faulted = model();
        faulted.inject_fault(Fault::FanFault);
        let (weak, notes) =
            faulted.advance(&hot, &flags, "Ruse", Season::Winter, at(12, 0), 60, false, &mut rng());

        assert!(weak.temperature_c > cooled.temperature_c);
        assert!(notes.contains_key("Ventilation"));

        // Windows path ignores the fan fault
        flags.ventilation = false;
        flags.windows = true;
        let (_, notes) =
            faulted.advance(&hot, &flags, "Ruse", Season::Winter, at(12, 0), 60, false, &mut rng());
        assert!(!notes.contains_key("Ventilation"));
    }

    #[test]
    fn test_misting_raises_humidity_and_cools() {
        let mut env = model();
        let mut flags = ActuatorFlags::blank();
        let (baseline, _) =
            env.advance(&mild(), &flags, "Varna", Season::Spring, at(10, 0), 60, false, &mut rng());
        flags.misting = true;
        let (misted, _) =
            env.advance(&mild(), &flags, "Varna", Season::Spring, at(10, 0), 60, false, &mut rng());

        assert!((misted.humidity_pct - baseline.humidity_pct - 7.0).abs() < 1e-9);
        assert!((baseline.temperature_c - misted.temperature_c - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_lighting_converges_toward_lamp_target() {
        let mut env = model();
        let mut flags = ActuatorFlags::blank();
        flags.lighting = true;
        let mut state = mild();
        state.light_lux = 50.0;

        for minute in (0..60).step_by(15) {
            let (next, _) = env.advance(
                &state, &flags, "Ruse", Season::Winter, at(22, minute), 15, false, &mut rng(),
            );
            assert!(next.light_lux > state.light_lux);
            state = next;
        }
        assert!(state.light_lux > 350.0 && state.light_lux < 492.0);
    }

    #[test]
    fn test_rain_indicator_follows_forecast() {
        let mut env = model();
        let flags = ActuatorFlags::blank();
        let (wet, _) =
            env.advance(&mild(), &flags, "Ruse", Season::Fall, at(12, 0), 15, true, &mut rng());
        assert_eq!(wet.rain_mm, 3.5);

        let (dry, _) =
            env.advance(&wet, &flags, "Ruse", Season::Fall, at(12, 15), 15, false, &mut rng());
        assert_eq!(dry.rain_mm, 0.0);
    }

    #[test]
    fn test_anomaly_modifiers_on_drivers() {
        let mut env = model();
        let base = env.ambient("Sofia", Season::Summer, at(12, 0));

        env.set_anomaly(Anomaly::HeatWave, at(11, 0), Duration::hours(3));
        let hot = env.ambient("Sofia", Season::Summer, at(12, 0));
        assert!((hot.outside_temp_c - base.outside_temp_c - 8.0).abs() < 1e-9);

        env.set_anomaly(Anomaly::LowLight, at(11, 0), Duration::hours(3));
        let dim = env.ambient("Sofia", Season::Summer, at(12, 0));
        assert!((dim.natural_light_lux - base.natural_light_lux * 0.45).abs() < 1e-9);
        assert_eq!(dim.outside_temp_c, base.outside_temp_c);

        env.set_anomaly(Anomaly::ColdSnap, at(11, 0), Duration::hours(3));
        let cold = env.ambient("Sofia", Season::Summer, at(12, 0));
        assert!((base.outside_temp_c - cold.outside_temp_c - 10.0).abs() < 1e-9);
        assert_eq!(cold.natural_light_lux, base.natural_light_lux);
    }

    #[test]
    fn test_cold_snap_cools_through_leak() {
        let flags = ActuatorFlags::blank();
        let (reference, _) =
            model().advance(&mild(), &flags, "Ruse", Season::Winter, at(12, 0), 60, false, &mut rng());

        let mut env = model();
        env.set_anomaly(Anomaly::ColdSnap, at(11, 0), Duration::hours(3));
        let (next, notes) =
            env.advance(&mild(), &flags, "Ruse", Season::Winter, at(12, 0), 60, false, &mut rng());

        // Leak of 0.06 toward an outside 10 °C colder
        assert!((reference.temperature_c - next.temperature_c - 0.6).abs() < 1e-9);
        assert_eq!(notes.get("anomaly").map(String::as_str), Some("Cold snap"));
    }

    #[test]
    fn test_humid_air_anomaly_pulls_humidity_up() {
        let flags = ActuatorFlags::blank();
        let (reference, _) =
            model().advance(&mild(), &flags, "Ruse", Season::Winter, at(9, 0), 60, false, &mut rng());

        let mut env = model();
        env.set_anomaly(Anomaly::HumidAir, at(8, 0), Duration::hours(3));
        let (next, notes) =
            env.advance(&mild(), &flags, "Ruse", Season::Winter, at(9, 0), 60, false, &mut rng());

        assert!(next.humidity_pct > reference.humidity_pct);
        assert!(next.humidity_pct > mild().humidity_pct);
        assert_eq!(notes.get("anomaly").map(String::as_str), Some("Humid air event"));
    }

    #[test]
    fn test_fault_anomaly_sets_and_releases_fault() {
        let mut env = model();
        let flags = ActuatorFlags::blank();
        env.set_anomaly(Anomaly::PumpFault, at(8, 0), Duration::hours(1));

        let (_, notes) =
            env.advance(&mild(), &flags, "Ruse", Season::Winter, at(8, 15), 15, false, &mut rng());
        assert!(env.faults().pump_fault);
        assert_eq!(notes.get("anomaly").map(String::as_str), Some("Pump fault injected"));

        env.advance(&mild(), &flags, "Ruse", Season::Winter, at(9, 15), 15, false, &mut rng());
        assert!(!env.faults().pump_fault);
        assert_eq!(env.anomaly().code(), Anomaly::Normal);
    }

    #[test]
    fn test_random_fault_survives_unrelated_anomaly_clear() {
        let mut env = model();
        env.inject_fault(Fault::FanFault);
        env.set_anomaly(Anomaly::DryAir, at(8, 0), Duration::hours(1));
        env.clear_anomaly();
        assert!(env.faults().fan_fault);

        env.reset_faults();
        assert!(!env.faults().any());
    }

    #[test]
    fn test_injected_fault_survives_its_fault_anomaly() {
        let mut env = model();
        let flags = ActuatorFlags::blank();
        env.inject_fault(Fault::PumpFault);
        env.set_anomaly(Anomaly::PumpFault, at(8, 0), Duration::hours(1));
        env.advance(&mild(), &flags, "Ruse", Season::Winter, at(8, 15), 15, false, &mut rng());

        env.clear_anomaly();
        assert!(env.faults().pump_fault);

        // Same on expiry
        env.set_anomaly(Anomaly::PumpFault, at(8, 30), Duration::hours(1));
        env.advance(&mild(), &flags, "Ruse", Season::Winter, at(9, 45), 15, false, &mut rng());
        assert_eq!(env.anomaly().code(), Anomaly::Normal);
        assert!(env.faults().pump_fault);
    }

    #[test]
    fn test_fault_injected_during_anomaly_is_kept() {
        let mut env = model();
        let flags = ActuatorFlags::blank();
        env.set_anomaly(Anomaly::MisterFault, at(8, 0), Duration::hours(1));
        env.advance(&mild(), &flags, "Ruse", Season::Winter, at(8, 15), 15, false, &mut rng());
        env.inject_fault(Fault::MisterFault);

        env.clear_anomaly();
        assert!(env.faults().mister_fault);
    }

    #[test]
    fn test_night_floor_uses_configured_window() {
        let window = NightWindow {
            start_hour: 18,
            end_hour: 8,
        };
        let mut env = model().with_night_window(window);
        let frozen = StateVector {
            temperature_c: -15.0,
            ..mild()
        };
        let flags = ActuatorFlags::blank();

        let (next, _) =
            env.advance(&frozen, &flags, "Sofia", Season::Winter, at(19, 0), 15, false, &mut rng());
        assert_eq!(next.temperature_c, 8.0);

        // 19:00 is daytime under the default window
        let (unfloored, _) = model().advance(
            &frozen, &flags, "Sofia", Season::Winter, at(19, 0), 15, false, &mut rng(),
        );
        assert!(unfloored.temperature_c < 0.0);
    }

    #[test]
    fn test_non_finite_constants_are_rejected() {
        let tuning = EnvironmentTuning {
            temp_leak_cap: f64::NAN,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());

        let tuning = EnvironmentTuning {
            heating_rate_c_per_hour: f64::INFINITY,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
        assert!(EnvironmentTuning::default().validate().is_ok());
    }

    #[test]
    fn test_dry_soil_anomaly_pulls_soil_down() {
        let mut env = model();
        let flags = ActuatorFlags::blank();
        env.set_anomaly(Anomaly::DrySoil, at(8, 0), Duration::hours(3));
        let (next, _) =
            env.advance(&mild(), &flags, "Ruse", Season::Winter, at(9, 0), 60, false, &mut rng());
        assert!(next.soil_moisture_pct < 37.0);
    }

    #[test]
    fn test_noise_is_reproducible_with_seed() {
        let mut env = EnvironmentModel::new(
            Arc::new(ClimateProfile::builtin()),
            EnvironmentTuning::default(),
        );
        let flags = ActuatorFlags::blank();
        let (a, _) = env.advance(
            &mild(), &flags, "Ruse", Season::Winter, at(12, 0), 15, false,
            &mut StdRng::seed_from_u64(99),
        );
        let (b, _) = env.advance(
            &mild(), &flags, "Ruse", Season::Winter, at(12, 0), 15, false,
            &mut StdRng::seed_from_u64(99),
        );
        assert_eq!(a, b);
    }
}
