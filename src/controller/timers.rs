use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::{Actuator, ActuatorFlags};

/// When an actuator last switched on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationTimer {
    pub activated_at: Option<NaiveDateTime>,
}

impl ActivationTimer {
    /// True when the actuator is not latched or has been on for at least `min_on`
    pub fn min_on_elapsed(&self, now: NaiveDateTime, min_on: Duration) -> bool {
        match self.activated_at {
            None => true,
            Some(started) => now - started >= min_on,
        }
    }
}

/// Per-actuator activation timers, touched only on flag transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationTimers {
    timers: HashMap<Actuator, ActivationTimer>,
}

impl Default for ActivationTimers {
    fn default() -> Self {
        Self {
            timers: Actuator::timed()
                .map(|a| (a, ActivationTimer::default()))
                .collect(),
        }
    }
}

impl ActivationTimers {
    pub fn get(&self, actuator: Actuator) -> ActivationTimer {
        self.timers.get(&actuator).copied().unwrap_or_default()
    }

    pub fn min_on_elapsed(&self, actuator: Actuator, now: NaiveDateTime, min_on: Duration) -> bool {
        self.get(actuator).min_on_elapsed(now, min_on)
    }

    /// Start timers for false→true flags and clear them for true→false flags.
    /// Returns the actuators that changed state.
    pub fn record_transitions(
        &mut self,
        previous: &ActuatorFlags,
        next: &ActuatorFlags,
        now: NaiveDateTime,
    ) -> Vec<(Actuator, bool)> {
        let mut changed = Vec::new();
        for actuator in Actuator::timed() {
            let was_on = previous.get(actuator);
            let is_on = next.get(actuator);
            if was_on == is_on {
                continue;
            }
            let timer = self.timers.entry(actuator).or_default();
            timer.activated_at = is_on.then_some(now);
            changed.push((actuator, is_on));
        }
        changed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
