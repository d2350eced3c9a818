//! Tick orchestration: one controller evaluation followed by one
//! environment step, plus the bookkeeping around it.

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{debug, info};

use super::clock::SimClock;
use super::environment::{EnvironmentModel, Notes};
use super::faults::RandomFaultInjector;
use crate::config::Config;
use crate::controller::{ActuatorController, Decision, MaintenanceWarning, Reason, RuntimeTracker};
use crate::domain::{
    Actuator, ActuatorFlags, Anomaly, Fault, FaultState, StateVector, Targets,
    DEFAULT_ANOMALY_DURATION_HOURS,
};
use crate::profile::{ClimateProfile, ProfileSelection, Season};
use crate::repo::{Reading, Repositories};

/// Who drives the actuators
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Auto,
    /// Operator control: the decision engine is bypassed and every flag is off
    Manual,
}

/// Inputs of a single tick
#[derive(Debug, Clone)]
pub struct TickInput<'a> {
    pub mode: ControlMode,
    pub state: StateVector,
    pub targets: Targets,
    pub rain_forecast: bool,
    pub city: &'a str,
    pub season: Season,
    pub now: NaiveDateTime,
    pub tick_minutes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub state: StateVector,
    pub flags: ActuatorFlags,
    pub reasons: Vec<Reason>,
    pub notes: Notes,
}

/// Decide, then advance the environment under the decided flags.
pub fn tick<R: Rng + ?Sized>(
    controller: &mut ActuatorController,
    environment: &mut EnvironmentModel,
    input: TickInput<'_>,
    rng: &mut R,
) -> TickOutcome {
    let decision = match input.mode {
        ControlMode::Auto => controller.decide(
            &input.state,
            &input.targets,
            input.rain_forecast,
            &environment.faults(),
            input.now,
        ),
        ControlMode::Manual => Decision::manual(),
    };

    let (state, notes) = environment.advance(
        &input.state,
        &decision.flags,
        input.city,
        input.season,
        input.now,
        input.tick_minutes,
        input.rain_forecast,
        rng,
    );

    TickOutcome {
        state,
        flags: decision.flags,
        reasons: decision.reasons,
        notes,
    }
}

/// Immutable view of one completed tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub now: NaiveDateTime,
    pub night: bool,
    pub mode: ControlMode,
    pub selection: ProfileSelection,
    pub state: StateVector,
    pub targets: Targets,
    pub flags: ActuatorFlags,
    pub reasons: Vec<String>,
    pub notes: Notes,
    pub anomaly: Anomaly,
    pub faults: FaultState,
    pub maintenance: Vec<MaintenanceWarning>,
}

/// Owns every piece of simulation state and runs it one tick at a time
pub struct SimulationLoop {
    profile: Arc<ClimateProfile>,
    controller: ActuatorController,
    environment: EnvironmentModel,
    injector: RandomFaultInjector,
    runtime: RuntimeTracker,
    repos: Repositories,
    clock: SimClock,
    rng: StdRng,
    selection: ProfileSelection,
    mode: ControlMode,
    rain_forecast: bool,
    state: StateVector,
    last: Option<TickOutcome>,
    ticks: u64,
}

impl SimulationLoop {
    pub fn new(cfg: &Config, profile: Arc<ClimateProfile>, repos: Repositories) -> Self {
        let sim = &cfg.simulation;
        let rng = match sim.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_parts(cfg, profile, repos, SimClock::new(sim.clock.clone()), rng)
    }

    /// Construct with an explicit clock and random source
    pub fn with_parts(
        cfg: &Config,
        profile: Arc<ClimateProfile>,
        repos: Repositories,
        clock: SimClock,
        rng: StdRng,
    ) -> Self {
        Self {
            controller: ActuatorController::new(cfg.control.clone()),
            environment: EnvironmentModel::new(profile.clone(), cfg.environment.clone())
                .with_night_window(cfg.control.night_window),
            injector: cfg.simulation.random_faults.clone(),
            runtime: RuntimeTracker::new(cfg.maintenance.clone()),
            repos,
            clock,
            rng,
            selection: cfg.profile.clone(),
            mode: cfg.simulation.mode,
            rain_forecast: cfg.simulation.rain_forecast,
            state: cfg.simulation.initial_state.clamped(),
            last: None,
            ticks: 0,
            profile,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn state(&self) -> StateVector {
        self.state
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn selection(&self) -> &ProfileSelection {
        &self.selection
    }

    pub fn controller(&self) -> &ActuatorController {
        &self.controller
    }

    pub fn environment(&self) -> &EnvironmentModel {
        &self.environment
    }

    pub fn runtime(&self) -> &RuntimeTracker {
        &self.runtime
    }

    pub fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub fn set_mode(&mut self, mode: ControlMode) {
        if self.mode != mode {
            info!(%mode, "control mode changed");
            self.mode = mode;
        }
    }

    pub fn set_rain_forecast(&mut self, on: bool) {
        self.rain_forecast = on;
    }

    pub fn set_selection(&mut self, selection: ProfileSelection) {
        if let Err(e) = self.profile.check_selection(&selection) {
            debug!(error = %e, "selection not in profile tables, using fallbacks");
        }
        self.selection = selection;
    }

    /// Override the current sensor values, e.g. from operator input
    pub fn set_state(&mut self, state: StateVector) {
        self.state = state.clamped();
    }

    /// Start an anomaly at the current clock time. `Normal` clears.
    pub fn set_anomaly(&mut self, anomaly: Anomaly, duration: Option<Duration>) {
        let now = self.clock.now();
        if anomaly == Anomaly::Normal {
            self.environment.clear_anomaly();
            self.repos.events.log(now, "Anomaly cleared -> NORMAL");
            return;
        }
        let duration = duration.unwrap_or_else(default_anomaly_duration);
        self.environment.set_anomaly(anomaly, now, duration);
        self.repos.events.log(now, format!("Anomaly set -> {anomaly}"));
    }

    pub fn inject_fault(&mut self, fault: Fault) {
        self.environment.inject_fault(fault);
    }

    pub fn reset_faults(&mut self) {
        self.environment.reset_faults();
    }

    pub fn reset_maintenance(&mut self, actuator: Actuator) {
        self.runtime.reset(actuator);
    }

    pub fn reset_clock_to_now(&mut self) {
        self.clock.reset_to_now();
    }

    fn targets_at(&self, now: NaiveDateTime) -> (bool, Targets) {
        let night = self.controller.is_night(now);
        (night, self.profile.targets(&self.selection.plant, night))
    }

    /// Rain forecast as seen by the controller: manual flag or storm anomaly
    fn effective_rain_forecast(&self, now: NaiveDateTime) -> bool {
        self.rain_forecast || self.environment.active_anomaly(now) == Anomaly::RainForecast
    }

    /// Run one full tick and return its snapshot
    pub fn step(&mut self) -> TickSnapshot {
        let now = self.clock.advance();
        let tick_minutes = self.clock.minutes_per_tick();
        let (_, targets) = self.targets_at(now);
        let rain_forecast = self.effective_rain_forecast(now);

        if let Some(fault) = self.injector.roll(&mut self.rng) {
            self.environment.inject_fault(fault);
            self.repos
                .events
                .log(now, format!("Random fault injected -> {fault}"));
        }

        let outcome = tick(
            &mut self.controller,
            &mut self.environment,
            TickInput {
                mode: self.mode,
                state: self.state,
                targets,
                rain_forecast,
                city: &self.selection.city,
                season: self.selection.season,
                now,
                tick_minutes,
            },
            &mut self.rng,
        );

        self.runtime.record(&outcome.flags, tick_minutes);
        self.state = outcome.state;
        self.repos
            .readings
            .insert(Reading::from_state(now, &self.state));

        let anomaly = self.environment.active_anomaly(now);
        if anomaly != Anomaly::Normal {
            if let Some(note) = outcome.notes.get("anomaly") {
                self.repos
                    .events
                    .log(now, format!("Anomaly active -> {anomaly} ({note})"));
            }
        }
        if !outcome.reasons.is_empty() {
            let head: Vec<String> = outcome.reasons.iter().take(3).map(ToString::to_string).collect();
            self.repos
                .events
                .log(now, format!("Reasons: {}", head.join("; ")));
        }

        self.ticks += 1;
        debug!(
            tick = self.ticks,
            %now,
            temperature_c = self.state.temperature_c,
            humidity_pct = self.state.humidity_pct,
            active = ?outcome.flags.active(),
            "tick complete"
        );

        self.last = Some(outcome);
        self.snapshot()
    }

    /// Snapshot of the latest tick, or of the initial state before any tick
    pub fn snapshot(&self) -> TickSnapshot {
        let now = self.clock.now();
        let (night, targets) = self.targets_at(now);
        let (flags, reasons, notes) = match &self.last {
            Some(outcome) => (
                outcome.flags,
                outcome.reasons.iter().map(ToString::to_string).collect(),
                outcome.notes.clone(),
            ),
            None => (ActuatorFlags::blank(), Vec::new(), Notes::new()),
        };

        TickSnapshot {
            tick: self.ticks,
            now,
            night,
            mode: self.mode,
            selection: self.selection.clone(),
            state: self.state,
            targets,
            flags,
            reasons,
            notes,
            anomaly: self.environment.active_anomaly(now),
            faults: self.environment.faults(),
            maintenance: self.runtime.warnings(),
        }
    }
}

fn default_anomaly_duration() -> Duration {
    Duration::minutes((DEFAULT_ANOMALY_DURATION_HOURS * 60.0) as i64)
}
