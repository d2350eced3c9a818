use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Equipment faults that degrade actuator effectiveness
#[derive(
    Debug,
    Clone,
    Copy,
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Fault {
    FanFault,
    PumpFault,
    MisterFault,
}

/// Three independent fault flags. Faults degrade, never disable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultState {
    pub fan_fault: bool,
    pub pump_fault: bool,
    pub mister_fault: bool,
}

impl FaultState {
    pub fn get(&self, fault: Fault) -> bool {
        match fault {
            Fault::FanFault => self.fan_fault,
            Fault::PumpFault => self.pump_fault,
            Fault::MisterFault => self.mister_fault,
        }
    }

    pub fn set(&mut self, fault: Fault, active: bool) {
        match fault {
            Fault::FanFault => self.fan_fault = active,
            Fault::PumpFault => self.pump_fault = active,
            Fault::MisterFault => self.mister_fault = active,
        }
    }

    pub fn any(&self) -> bool {
        self.fan_fault || self.pump_fault || self.mister_fault
    }

    /// Active faults in a stable order
    pub fn active(&self) -> Vec<Fault> {
        Fault::iter().filter(|f| self.get(*f)).collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_flags_are_independent() {
        let mut faults = FaultState::default();
        assert!(!faults.any());

        faults.set(Fault::PumpFault, true);
        assert!(faults.pump_fault);
        assert!(!faults.fan_fault);
        assert_eq!(faults.active(), vec![Fault::PumpFault]);

        faults.reset();
        assert!(!faults.any());
    }

    #[test]
    fn test_fault_display_uses_snake_case() {
        assert_eq!(Fault::MisterFault.to_string(), "mister_fault");
    }
}
