use anyhow::Result;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::engine::{SimulationLoop, TickSnapshot};

/// Real-time spacing between ticks never drops below this
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Read side of a running simulation
#[derive(Clone)]
pub struct SimulationHandle {
    sim: Arc<Mutex<SimulationLoop>>,
    rx: watch::Receiver<Arc<TickSnapshot>>,
}

impl SimulationHandle {
    /// Most recent complete snapshot
    pub fn latest(&self) -> Arc<TickSnapshot> {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TickSnapshot>> {
        self.rx.clone()
    }

    /// Apply an operator command between ticks
    pub fn with_loop<T>(&self, f: impl FnOnce(&mut SimulationLoop) -> T) -> T {
        f(&mut self.sim.lock())
    }
}

/// Drives a [`SimulationLoop`] on a tokio interval and publishes every
/// snapshot through a watch channel
pub struct SimulationRunner {
    sim: Arc<Mutex<SimulationLoop>>,
    tx: watch::Sender<Arc<TickSnapshot>>,
    tick_interval: Duration,
}

impl SimulationRunner {
    pub fn new(sim: SimulationLoop, tick_interval: Duration) -> (Self, SimulationHandle) {
        let (tx, rx) = watch::channel(Arc::new(sim.snapshot()));
        let sim = Arc::new(Mutex::new(sim));
        let handle = SimulationHandle {
            sim: sim.clone(),
            rx,
        };
        let runner = Self {
            sim,
            tx,
            tick_interval: tick_interval.max(MIN_TICK_INTERVAL),
        };
        (runner, handle)
    }

    /// Tick until `shutdown` resolves. Returns the number of ticks run.
    pub async fn run<F>(self, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval_ms = self.tick_interval.as_millis() as u64, "simulation loop started");
        let mut ticks = 0u64;
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    // Lock is held for the synchronous step only
                    let snapshot = self.sim.lock().step();
                    debug!(tick = snapshot.tick, now = %snapshot.now, "snapshot published");
                    self.tx.send_replace(Arc::new(snapshot));
                    ticks += 1;
                }
            }
        }

        warn!(ticks, "simulation loop stopped");
        Ok(ticks)
    }
}
