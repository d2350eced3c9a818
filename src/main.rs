use anyhow::Result;
use greenhouse_controller::{config, profile, repo, simulation, telemetry};
use config::Config;
use profile::ClimateProfile;
use repo::Repositories;
use simulation::{SimulationLoop, SimulationRunner};
use std::sync::Arc;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    let profile = Arc::new(ClimateProfile::builtin());
    if let Err(e) = profile.check_selection(&cfg.profile) {
        warn!(error = %e, "selection not in profile tables, falling back to defaults");
    }

    let repos = Repositories::new(&cfg.storage);
    let sim = SimulationLoop::new(&cfg, profile, repos);

    info!(
        city = %cfg.profile.city,
        season = %cfg.profile.season,
        plant = %cfg.profile.plant,
        mode = %cfg.simulation.mode,
        start = %sim.now(),
        "starting greenhouse controller"
    );

    let (runner, handle) = SimulationRunner::new(sim, cfg.simulation.tick_interval());
    let ticks = runner.run(telemetry::shutdown_signal()).await?;

    let last = handle.latest();
    info!(
        ticks,
        now = %last.now,
        temperature_c = last.state.temperature_c,
        humidity_pct = last.state.humidity_pct,
        soil_moisture_pct = last.state.soil_moisture_pct,
        "final state"
    );
    warn!("shutdown complete");
    Ok(())
}
