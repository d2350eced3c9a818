use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::StateVector;

/// One persisted sensor sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub light_lux: f64,
    pub rain_mm: f64,
    pub soil_moisture_pct: f64,
}

impl Reading {
    pub fn from_state(timestamp: NaiveDateTime, state: &StateVector) -> Self {
        Self {
            timestamp,
            temperature_c: state.temperature_c,
            humidity_pct: state.humidity_pct,
            light_lux: state.light_lux,
            rain_mm: state.rain_mm,
            soil_moisture_pct: state.soil_moisture_pct,
        }
    }
}

/// Time-series store for readings, keyed by timestamp.
/// Every query returns rows in ascending timestamp order.
pub trait ReadingStore: Send + Sync {
    /// Insert a reading, replacing any row with the same timestamp
    fn insert(&self, reading: Reading);

    fn all(&self) -> Vec<Reading>;

    /// The most recent `n` rows
    fn last_n(&self, n: usize) -> Vec<Reading>;

    /// Rows at or after `from`
    fn since(&self, from: NaiveDateTime) -> Vec<Reading>;

    /// Rows in `[from, to]`
    fn between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Reading>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReadingStore {
    rows: RwLock<BTreeMap<NaiveDateTime, Reading>>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadingStore for InMemoryReadingStore {
    fn insert(&self, reading: Reading) {
        self.rows.write().insert(reading.timestamp, reading);
    }

    fn all(&self) -> Vec<Reading> {
        self.rows.read().values().copied().collect()
    }

    fn last_n(&self, n: usize) -> Vec<Reading> {
        let rows = self.rows.read();
        let mut tail: Vec<Reading> = rows.values().rev().take(n).copied().collect();
        tail.reverse();
        tail
    }

    fn since(&self, from: NaiveDateTime) -> Vec<Reading> {
        self.rows.read().range(from..).map(|(_, r)| *r).collect()
    }

    fn between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Reading> {
        if from > to {
            return Vec::new();
        }
        self.rows.read().range(from..=to).map(|(_, r)| *r).collect()
    }

    fn len(&self) -> usize {
        self.rows.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 2)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(hour: u32, temperature_c: f64) -> Reading {
        Reading {
            timestamp: ts(hour),
            temperature_c,
            humidity_pct: 55.0,
            light_lux: 300.0,
            rain_mm: 0.0,
            soil_moisture_pct: 45.0,
        }
    }

    fn seeded() -> InMemoryReadingStore {
        let store = InMemoryReadingStore::new();
        // Out of order on purpose
        for hour in [3, 1, 4, 2, 0] {
            store.insert(reading(hour, f64::from(hour)));
        }
        store
    }

    #[test]
    fn test_rows_are_ordered_by_timestamp() {
        let hours: Vec<u32> = seeded()
            .all()
            .iter()
            .map(|r| r.temperature_c as u32)
            .collect();
        assert_eq!(hours, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_insert_replaces_same_timestamp() {
        let store = seeded();
        store.insert(reading(2, 99.0));
        assert_eq!(store.len(), 5);
        assert_eq!(store.between(ts(2), ts(2))[0].temperature_c, 99.0);
    }

    #[test]
    fn test_last_n_is_ascending() {
        let store = seeded();
        let last: Vec<f64> = store.last_n(2).iter().map(|r| r.temperature_c).collect();
        assert_eq!(last, vec![3.0, 4.0]);
        assert_eq!(store.last_n(50).len(), 5);
    }

    #[test]
    fn test_range_queries_are_inclusive() {
        let store = seeded();
        assert_eq!(store.since(ts(3)).len(), 2);
        assert_eq!(store.between(ts(1), ts(3)).len(), 3);
        assert!(store.between(ts(3), ts(1)).is_empty());
    }
}
