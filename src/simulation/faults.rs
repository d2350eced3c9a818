use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::Fault;

const FAULTS: [Fault; 3] = [Fault::FanFault, Fault::PumpFault, Fault::MisterFault];

/// Randomized equipment failures, evaluated once per tick
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_probability"))]
#[serde(default)]
pub struct RandomFaultInjector {
    pub enabled: bool,
    #[validate(range(min = 0.0, max = 1.0))]
    pub probability: f64,
}

impl Default for RandomFaultInjector {
    fn default() -> Self {
        Self {
            enabled: false,
            probability: 0.02,
        }
    }
}

fn validate_probability(injector: &RandomFaultInjector) -> Result<(), ValidationError> {
    if injector.probability.is_nan() {
        return Err(ValidationError::new("probability_not_a_number"));
    }
    Ok(())
}

impl RandomFaultInjector {
    /// Roll for a fault. Draws nothing from `rng` while disabled.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Fault> {
        if !self.enabled || self.probability <= 0.0 {
            return None;
        }
        if !rng.gen_bool(self.probability.min(1.0)) {
            return None;
        }
        FAULTS.choose(rng).copied()
    }
}
