//! Persisted tape positions
//!
//! A JSON object of element index to shared-timeline milliseconds, e.g.
//! `{"0":5000,"1":5000}`. Overwritten wholesale on every save.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::timeline::PhaseTable;
use crate::persistence::{KeyValueStore, StoreError};

/// Why a snapshot could not be saved or loaded
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed marquee snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Live state of one tape's animation at capture time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapeReading {
    /// `Animation.currentTime` in ms
    pub current_time_ms: f64,
    /// Start delay of the animation effect in ms, negative once restored
    pub delay_ms: f64,
    /// Iteration duration reported by the animation effect, if any
    pub duration_ms: Option<f64>,
}

impl TapeReading {
    pub fn new(current_time_ms: f64) -> Self {
        Self {
            current_time_ms,
            delay_ms: 0.0,
            duration_ms: None,
        }
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Time into the loop as displayed. `currentTime` restarts at zero when
    /// the animation is reapplied, so a negative start delay is added back.
    pub fn elapsed_ms(&self) -> f64 {
        self.current_time_ms - self.delay_ms
    }
}

/// Shared-timeline position per tracked element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarqueeSnapshot {
    positions: BTreeMap<usize, f64>,
}

impl MarqueeSnapshot {
    /// Build a snapshot from one optional reading per tracked element.
    /// Returns `None` when no element had a readable animation.
    pub fn capture(table: &PhaseTable, readings: &[Option<TapeReading>]) -> Option<Self> {
        let positions: BTreeMap<usize, f64> = readings
            .iter()
            .enumerate()
            .filter_map(|(index, reading)| {
                reading.map(|r| (index, table.capture(index, r.elapsed_ms(), r.duration_ms)))
            })
            .collect();

        if positions.is_empty() {
            None
        } else {
            Some(Self { positions })
        }
    }

    pub fn position(&self, index: usize) -> Option<f64> {
        self.positions.get(&index).copied()
    }

    /// Set the shared position for `index`, replacing any captured value
    pub fn insert(&mut self, index: usize, position_ms: f64) {
        self.positions.insert(index, position_ms);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.positions.iter().map(|(i, p)| (*i, *p))
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored blob, dropping entries that are not finite numbers
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let mut snapshot: Self = serde_json::from_str(json)?;
        snapshot.positions.retain(|_, p| p.is_finite());
        Ok(snapshot)
    }

    /// Overwrite `key` with this snapshot
    pub fn save<S: KeyValueStore>(&self, store: &mut S, key: &str) -> Result<(), SnapshotError> {
        let json = self.to_json()?;
        store.set(key, &json)?;
        Ok(())
    }

    /// Read the snapshot under `key`; `Ok(None)` when nothing was saved yet
    pub fn load<S: KeyValueStore>(store: &S, key: &str) -> Result<Option<Self>, SnapshotError> {
        match store.get(key)? {
            Some(json) => Ok(Some(Self::from_json(&json)?)),
            None => Ok(None),
        }
    }
}

/// Storage key for the snapshot, optionally scoped to a page path
pub fn storage_key(base: &str, per_page: bool, pathname: &str) -> String {
    if per_page {
        format!("{}-{}", base, pathname)
    } else {
        base.to_string()
    }
}
