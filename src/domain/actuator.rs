use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Named actuators driven by the controller
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum Actuator {
    Heating,
    Ventilation,
    Windows,
    Watering,
    Misting,
    Lighting,
    RainProtection,
    Alarm,
}

impl Actuator {
    /// Actuators that own an activation timer. Alarm is derived, never timed.
    pub fn timed() -> impl Iterator<Item = Actuator> {
        Actuator::iter().filter(|a| *a != Actuator::Alarm)
    }

    /// Physical equipment that accumulates runtime hours
    pub fn equipment() -> [Actuator; 6] {
        [
            Actuator::Heating,
            Actuator::Ventilation,
            Actuator::Windows,
            Actuator::Watering,
            Actuator::Misting,
            Actuator::Lighting,
        ]
    }
}

/// Snapshot of every actuator's on/off state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorFlags {
    pub heating: bool,
    pub ventilation: bool,
    pub windows: bool,
    pub watering: bool,
    pub misting: bool,
    pub lighting: bool,
    pub rain_protection: bool,
    pub alarm: bool,
}

impl ActuatorFlags {
    /// All actuators off
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn get(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::Heating => self.heating,
            Actuator::Ventilation => self.ventilation,
            Actuator::Windows => self.windows,
            Actuator::Watering => self.watering,
            Actuator::Misting => self.misting,
            Actuator::Lighting => self.lighting,
            Actuator::RainProtection => self.rain_protection,
            Actuator::Alarm => self.alarm,
        }
    }

    pub fn set(&mut self, actuator: Actuator, on: bool) {
        let slot = match actuator {
            Actuator::Heating => &mut self.heating,
            Actuator::Ventilation => &mut self.ventilation,
            Actuator::Windows => &mut self.windows,
            Actuator::Watering => &mut self.watering,
            Actuator::Misting => &mut self.misting,
            Actuator::Lighting => &mut self.lighting,
            Actuator::RainProtection => &mut self.rain_protection,
            Actuator::Alarm => &mut self.alarm,
        };
        *slot = on;
    }

    /// Actuators currently on, in declaration order
    pub fn active(&self) -> Vec<Actuator> {
        Actuator::iter().filter(|a| self.get(*a)).collect()
    }
}
