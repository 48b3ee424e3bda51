//! Site configuration
//!
//! Defaults live here; a page can override any field with an embedded
//! `<script id="site-config" type="application/json">` block.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::marquee::{PhaseTable, RetrySchedule};

/// Console log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }

    pub fn to_filter(self) -> log::LevelFilter {
        self.to_level().to_level_filter()
    }
}

/// Tape marquee persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarqueeConfig {
    /// Outer container of each tape
    pub container_selector: String,
    /// Animated strip inside a container
    pub inner_selector: String,
    /// Session-storage key
    pub storage_key: String,
    /// Suffix the key with the page path
    pub key_per_page: bool,
    /// Fallback loop duration when the animation doesn't report one
    pub cycle_ms: f64,
    /// Phase offset of each tape on the shared timeline, in selector order.
    /// Must mirror the stylesheet's per-tape animation delays.
    pub phase_offsets_ms: Vec<f64>,
    pub save_interval_ms: u32,
    pub initial_restore_delay_ms: u32,
    pub retry_delay_ms: u32,
    pub max_restore_attempts: u32,
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        Self {
            container_selector: ".tape".to_string(),
            inner_selector: ".tape-inner".to_string(),
            storage_key: MARQUEE_STORAGE_KEY.to_string(),
            key_per_page: false,
            cycle_ms: DEFAULT_CYCLE_MS,
            phase_offsets_ms: DEFAULT_PHASE_OFFSETS_MS.to_vec(),
            save_interval_ms: MARQUEE_SAVE_INTERVAL_MS,
            initial_restore_delay_ms: RESTORE_INITIAL_DELAY_MS,
            retry_delay_ms: RESTORE_RETRY_DELAY_MS,
            max_restore_attempts: RESTORE_MAX_ATTEMPTS,
        }
    }
}

impl MarqueeConfig {
    pub fn phase_table(&self) -> PhaseTable {
        PhaseTable::new(self.cycle_ms, self.phase_offsets_ms.clone())
    }

    pub fn retry_schedule(&self) -> RetrySchedule {
        RetrySchedule {
            initial_delay_ms: self.initial_restore_delay_ms,
            retry_delay_ms: self.retry_delay_ms,
            max_attempts: self.max_restore_attempts,
        }
    }
}

/// Mobile sidebar menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Widths at or below this show the toggle button
    pub breakpoint_px: f64,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            breakpoint_px: MENU_BREAKPOINT_PX,
        }
    }
}

/// Grid overlay look
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cell_px: u32,
    pub stroke: String,
    pub opacity: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_px: 20,
            stroke: "#104626".to_string(),
            opacity: 0.3,
        }
    }
}

/// Image modal timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    /// Delay before the fade-in class is added
    pub open_delay_ms: u32,
    /// Matches the CSS opacity transition
    pub close_delay_ms: u32,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            open_delay_ms: 10,
            close_delay_ms: 300,
        }
    }
}

/// Everything the page scripts can be tuned with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub log_level: LogLevel,
    pub marquee: MarqueeConfig,
    pub menu: MenuConfig,
    pub grid: GridConfig,
    pub modal: ModalConfig,
}

impl SiteConfig {
    /// Id of the embedded JSON config block
    pub const ELEMENT_ID: &'static str = "site-config";

    /// Parse a config block; malformed JSON falls back to defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring malformed site config: {}", e);
                Self::default()
            }
        }
    }

    /// Raise or lower the global log filter to the configured level.
    /// The logger is installed before config is read so parse warnings show.
    pub fn apply_log_level(&self) {
        log::set_max_level(self.log_level.to_filter());
    }

    /// Load config from the page (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::ELEMENT_ID))
            .and_then(|el| el.text_content());

        match text {
            Some(json) if !json.trim().is_empty() => Self::from_json(&json),
            _ => Self::default(),
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.marquee.storage_key, "marquee-state");
        assert_eq!(config.marquee.phase_offsets_ms, vec![0.0, 21_800.0, 15_300.0]);
        assert_eq!(config.marquee.retry_schedule(), RetrySchedule::default());
        assert_eq!(config.menu.breakpoint_px, 1024.0);
    }

    #[test]
    fn test_partial_override() {
        let config = SiteConfig::from_json(
            r#"{"log_level":"debug","marquee":{"phase_offsets_ms":[0,15000],"key_per_page":true}}"#,
        );
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.marquee.phase_offsets_ms, vec![0.0, 15_000.0]);
        assert!(config.marquee.key_per_page);
        // Untouched fields keep their defaults
        assert_eq!(config.marquee.cycle_ms, 30_000.0);
        assert_eq!(config.modal, ModalConfig::default());
    }

    #[test]
    fn test_malformed_falls_back() {
        assert_eq!(SiteConfig::from_json("{ nope"), SiteConfig::default());
        assert_eq!(SiteConfig::from_json(r#"{"log_level":"loud"}"#), SiteConfig::default());
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::Debug.to_level(), log::Level::Debug);
        assert_eq!(LogLevel::default().to_filter(), log::LevelFilter::Info);
        assert_eq!(LogLevel::Error.to_filter(), log::LevelFilter::Error);
    }

    /// Keeps warnings in memory so the startup order can be checked
    struct RecordingLogger {
        records: Mutex<Vec<(log::Level, String)>>,
    }

    impl log::Log for RecordingLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                if let Ok(mut records) = self.records.lock() {
                    records.push((record.level(), record.args().to_string()));
                }
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: RecordingLogger = RecordingLogger {
        records: Mutex::new(Vec::new()),
    };

    #[test]
    fn test_config_warning_reaches_logger_before_level_applied() {
        // Startup order: logger first at the default level, then config
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LogLevel::default().to_filter());

        let config = SiteConfig::from_json(r#"{"log_level":"error","marquee":"#);
        config.apply_log_level();
        assert_eq!(log::max_level(), log::LevelFilter::Info);

        let records = LOGGER.records.lock().unwrap();
        assert!(
            records
                .iter()
                .any(|(level, msg)| *level == log::Level::Warn && msg.contains("malformed site config"))
        );
    }

    #[test]
    fn test_trace_level_from_config() {
        let config = SiteConfig::from_json(r#"{"log_level":"trace"}"#);
        assert_eq!(config.log_level.to_filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_phase_table_from_config() {
        let table = MarqueeConfig::default().phase_table();
        assert_eq!(table.offset(1), 21_800.0);
        assert_eq!(table.cycle_ms(), 30_000.0);
    }
}
