//! Folio Web - client-side behaviour for a brutalist portfolio site
//!
//! Core modules:
//! - `marquee`: Tape marquee phase persistence across page loads
//! - `keynav`: Single-key navigation shortcuts
//! - `menu`: Mobile sidebar menu
//! - `grid`: Design grid overlay
//! - `modal`: Full-size image viewer
//! - `persistence`: Key-value storage seam (session/local storage)
//! - `platform`: Browser glue (timers, listeners, DOM helpers)
//! - `settings`: Site configuration

pub mod grid;
pub mod keynav;
pub mod marquee;
pub mod menu;
pub mod modal;
pub mod persistence;
pub mod platform;
pub mod settings;

pub use marquee::{PhaseTable, TapeSync};
pub use settings::{LogLevel, SiteConfig};

/// Site-wide defaults
pub mod consts {
    /// Tape loop length, must match the stylesheet's `animation-duration`
    pub const DEFAULT_CYCLE_MS: f64 = 30_000.0;
    /// Per-tape phase on the shared timeline, mirrors the stylesheet delays
    pub const DEFAULT_PHASE_OFFSETS_MS: [f64; 3] = [0.0, 21_800.0, 15_300.0];

    /// Session-storage key for tape positions
    pub const MARQUEE_STORAGE_KEY: &str = "marquee-state";
    pub const MARQUEE_SAVE_INTERVAL_MS: u32 = 2_000;

    /// Restore retry timing
    pub const RESTORE_INITIAL_DELAY_MS: u32 = 500;
    pub const RESTORE_RETRY_DELAY_MS: u32 = 200;
    pub const RESTORE_MAX_ATTEMPTS: u32 = 15;

    /// Widths at or below this use the mobile menu
    pub const MENU_BREAKPOINT_PX: f64 = 1024.0;
}
