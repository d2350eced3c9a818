use chrono::{Duration, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Clock settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClockConfig {
    /// Advance by `minutes_per_tick` instead of following wall time
    pub simulated: bool,
    #[validate(range(min = 1, max = 1440))]
    pub minutes_per_tick: u32,
    /// Hour of day the simulated clock starts at
    #[validate(range(max = 23))]
    pub start_hour: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            simulated: true,
            minutes_per_tick: 15,
            start_hour: 6,
        }
    }
}

/// Time source for the tick loop
#[derive(Debug, Clone)]
pub struct SimClock {
    config: ClockConfig,
    now: NaiveDateTime,
}

impl SimClock {
    /// Start today at the configured hour
    pub fn new(config: ClockConfig) -> Self {
        let wall = Local::now().naive_local();
        let start = wall
            .date()
            .and_hms_opt(config.start_hour.min(23), 0, 0)
            .unwrap_or(wall);
        Self::starting_at(config, start)
    }

    pub fn starting_at(config: ClockConfig, start: NaiveDateTime) -> Self {
        Self { config, now: start }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn is_simulated(&self) -> bool {
        self.config.simulated
    }

    pub fn minutes_per_tick(&self) -> u32 {
        self.config.minutes_per_tick
    }

    /// Move to the next tick and return the new time
    pub fn advance(&mut self) -> NaiveDateTime {
        self.now = if self.config.simulated {
            self.now + Duration::minutes(i64::from(self.config.minutes_per_tick))
        } else {
            wall_clock_minute()
        };
        self.now
    }

    /// Snap to the current wall-clock minute
    pub fn reset_to_now(&mut self) {
        self.now = wall_clock_minute();
    }
}

fn wall_clock_minute() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_simulated_clock_steps_by_tick() {
        let mut clock = SimClock::starting_at(ClockConfig::default(), start());
        assert_eq!(clock.advance(), start() + Duration::minutes(15));
        assert_eq!(clock.advance(), start() + Duration::minutes(30));
        assert_eq!(clock.now().hour(), 0);
    }

    #[test]
    fn test_new_starts_at_configured_hour() {
        let clock = SimClock::new(ClockConfig {
            start_hour: 9,
            ..Default::default()
        });
        assert_eq!(clock.now().hour(), 9);
        assert_eq!(clock.now().minute(), 0);
    }

    #[test]
    fn test_wall_clock_is_truncated_to_minute() {
        let mut clock = SimClock::starting_at(
            ClockConfig {
                simulated: false,
                ..Default::default()
            },
            start(),
        );
        let now = clock.advance();
        assert_eq!(now.second(), 0);
        assert_eq!(now.nanosecond(), 0);

        clock.reset_to_now();
        assert_eq!(clock.now().second(), 0);
    }
}
