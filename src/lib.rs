pub mod config;
pub mod controller;
pub mod domain;
pub mod profile;
pub mod repo;
pub mod simulation;
pub mod telemetry;
