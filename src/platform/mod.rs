//! Platform abstraction layer
//!
//! Handles browser plumbing shared by every component:
//! - Window/document lookup
//! - Timers (timeout/interval)
//! - Event listener registration
//! - Visibility and ready-state detection
//! - Style helpers
//!
//! Everything here is WASM only; the component cores are plain Rust.

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::*;
