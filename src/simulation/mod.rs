//! # Greenhouse Simulation Module
//!
//! Closed-loop simulation of the enclosure and its outside surroundings.
//!
//! ## Components
//!
//! - **Ambient**: outside temperature/humidity with a day/night swing, and natural light by day arc
//! - **Environment**: evolves the state vector under actuator flags, anomalies and faults
//! - **Faults**: randomized equipment failures
//! - **Clock**: simulated or wall-clock time source
//! - **Engine**: the `tick` entry point and the `SimulationLoop` orchestrator
//! - **Runner**: async tick loop publishing snapshots through a watch channel
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use greenhouse_controller::config::Config;
//! use greenhouse_controller::profile::ClimateProfile;
//! use greenhouse_controller::repo::Repositories;
//! use greenhouse_controller::simulation::SimulationLoop;
//!
//! let cfg = Config::default();
//! let mut sim = SimulationLoop::new(&cfg, Arc::new(ClimateProfile::builtin()), Repositories::in_memory());
//!
//! let snapshot = sim.step();
//! println!("{:.1} °C, heating = {}", snapshot.state.temperature_c, snapshot.flags.heating);
//! ```

pub mod ambient;
pub mod clock;
pub mod engine;
pub mod environment;
pub mod faults;
pub mod runner;

pub use ambient::{baseline_drivers, natural_light_lux, outside_conditions, AmbientDrivers};
pub use clock::{ClockConfig, SimClock};
pub use engine::{tick, ControlMode, SimulationLoop, TickInput, TickOutcome, TickSnapshot};
pub use environment::{EnvironmentModel, EnvironmentTuning, Notes};
pub use faults::RandomFaultInjector;
pub use runner::{SimulationHandle, SimulationRunner, MIN_TICK_INTERVAL};
