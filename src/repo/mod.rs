use std::sync::Arc;

use crate::config::StorageConfig;

pub mod events;
pub mod readings;

pub use events::EventLog;
pub use readings::{InMemoryReadingStore, Reading, ReadingStore};

/// Persistence collaborators shared between the tick loop and readers
#[derive(Clone)]
pub struct Repositories {
    pub readings: Arc<dyn ReadingStore>,
    pub events: Arc<EventLog>,
}

impl Repositories {
    pub fn new(cfg: &StorageConfig) -> Self {
        Self {
            readings: Arc::new(InMemoryReadingStore::new()),
            events: Arc::new(EventLog::new(cfg.event_log_keep_last, cfg.event_log_path.clone())),
        }
    }

    /// In-memory stores with no event-log file
    pub fn in_memory() -> Self {
        Self::new(&StorageConfig::default())
    }
}
