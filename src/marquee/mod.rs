//! Marquee state persistence
//!
//! Looping "tape" marquees are rebuilt from scratch on every page, so their
//! CSS animation would restart at zero on each navigation. This module keeps
//! them on one continuous timeline:
//! - `timeline`: per-element phase offsets and modulo math
//! - `snapshot`: the session-storage blob
//! - `retry`: bounded retry machine for late-attaching animations
//! - `sync`: capture/restore driver over a `TapeDeck`
//! - `dom`: browser wiring (WASM only)

pub mod retry;
pub mod snapshot;
pub mod sync;
pub mod timeline;

#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use retry::{AttemptOutcome, RestoreRetry, RetryPhase, RetrySchedule};
pub use snapshot::{MarqueeSnapshot, SnapshotError, TapeReading, storage_key};
pub use sync::{RestoreBatch, RestoreTarget, SaveOutcome, TapeDeck, TapeSync};
pub use timeline::{PhaseTable, start_delay_secs, wrap_ms};
