use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::Fault;

/// Default lifetime of an externally triggered anomaly
pub const DEFAULT_ANOMALY_DURATION_HOURS: f64 = 3.0;

/// Catalog of timed deviations from baseline conditions
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
pub enum Anomaly {
    #[default]
    Normal,
    DryAir,
    HumidAir,
    LowLight,
    HeatWave,
    ColdSnap,
    DrySoil,
    RainForecast,
    FanFault,
    PumpFault,
    MisterFault,
}

impl Anomaly {
    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Anomaly::Normal => "Normal",
            Anomaly::DryAir => "Dry air",
            Anomaly::HumidAir => "Humid air",
            Anomaly::LowLight => "Low light (clouds)",
            Anomaly::HeatWave => "Heat wave",
            Anomaly::ColdSnap => "Cold snap",
            Anomaly::DrySoil => "Dry soil",
            Anomaly::RainForecast => "Rain forecast",
            Anomaly::FanFault => "Fan fault",
            Anomaly::PumpFault => "Pump fault",
            Anomaly::MisterFault => "Mister fault",
        }
    }

    /// Fault flag this anomaly raises while active
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Anomaly::FanFault => Some(Fault::FanFault),
            Anomaly::PumpFault => Some(Fault::PumpFault),
            Anomaly::MisterFault => Some(Fault::MisterFault),
            _ => None,
        }
    }
}

/// At most one anomaly is active; it expires on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyState {
    active: Anomaly,
    expires_at: Option<NaiveDateTime>,
}

impl AnomalyState {
    /// Replace whatever is active with `anomaly` for `duration`.
    /// Setting `Normal` is the same as clearing.
    pub fn set(&mut self, anomaly: Anomaly, now: NaiveDateTime, duration: Duration) {
        if anomaly == Anomaly::Normal {
            self.clear();
            return;
        }
        self.active = anomaly;
        self.expires_at = Some(now + duration);
    }

    /// Return to `Normal`, yielding the anomaly that was active
    pub fn clear(&mut self) -> Option<Anomaly> {
        let previous = self.active;
        self.active = Anomaly::Normal;
        self.expires_at = None;
        (previous != Anomaly::Normal).then_some(previous)
    }

    /// Clear the anomaly if the clock has passed its expiry.
    /// Returns the anomaly that expired, if any.
    pub fn expire(&mut self, now: NaiveDateTime) -> Option<Anomaly> {
        if self.active == Anomaly::Normal {
            return None;
        }
        match self.expires_at {
            Some(until) if now <= until => None,
            _ => self.clear(),
        }
    }

    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        self.active != Anomaly::Normal && self.expires_at.is_some_and(|until| now <= until)
    }

    /// The anomaly in effect at `now`, `Normal` once expired
    pub fn current(&self, now: NaiveDateTime) -> Anomaly {
        if self.is_active(now) {
            self.active
        } else {
            Anomaly::Normal
        }
    }

    pub fn code(&self) -> Anomaly {
        self.active
    }

    pub fn expires_at(&self) -> Option<NaiveDateTime> {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_anomaly_active_until_inclusive_expiry() {
        let mut state = AnomalyState::default();
        state.set(Anomaly::HeatWave, t0(), Duration::hours(3));

        assert!(state.is_active(t0() + Duration::hours(3)));
        assert_eq!(state.expire(t0() + Duration::hours(3)), None);
        assert_eq!(state.code(), Anomaly::HeatWave);

        let late = t0() + Duration::hours(3) + Duration::minutes(1);
        assert!(!state.is_active(late));
        assert_eq!(state.current(late), Anomaly::Normal);
        assert_eq!(state.expire(late), Some(Anomaly::HeatWave));
        assert_eq!(state.code(), Anomaly::Normal);
        assert_eq!(state.expires_at(), None);
    }

    #[test]
    fn test_setting_new_anomaly_replaces_old() {
        let mut state = AnomalyState::default();
        state.set(Anomaly::DryAir, t0(), Duration::hours(3));
        state.set(Anomaly::LowLight, t0(), Duration::hours(1));

        assert_eq!(state.code(), Anomaly::LowLight);
        assert_eq!(state.expires_at(), Some(t0() + Duration::hours(1)));
    }

    #[test]
    fn test_setting_normal_clears() {
        let mut state = AnomalyState::default();
        state.set(Anomaly::ColdSnap, t0(), Duration::hours(3));
        state.set(Anomaly::Normal, t0(), Duration::hours(3));
        assert_eq!(state.code(), Anomaly::Normal);
        assert_eq!(state.clear(), None);
    }

    #[test]
    fn test_codes_and_fault_links() {
        assert_eq!(Anomaly::from_str("HEAT_WAVE").unwrap(), Anomaly::HeatWave);
        assert_eq!(Anomaly::RainForecast.to_string(), "RAIN_FORECAST");
        assert_eq!(Anomaly::PumpFault.fault(), Some(Fault::PumpFault));
        assert_eq!(Anomaly::HeatWave.fault(), None);
    }
}
