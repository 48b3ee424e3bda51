//! Folio Web entry point
//!
//! Handles platform-specific initialization and wires every page component.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_site {
    use folio_web::platform;
    use folio_web::{LogLevel, SiteConfig};

    pub fn run() {
        console_error_panic_hook::set_once();

        // The global max level does the filtering, so config warnings are
        // visible before the configured level is known
        if let Err(e) = console_log::init_with_level(log::Level::Trace) {
            // A logger is already installed; keep using it
            web_sys::console::warn_1(&format!("Logger init skipped: {}", e).into());
        }
        log::set_max_level(LogLevel::default().to_filter());

        let config = SiteConfig::load();
        config.apply_log_level();

        log::info!("Folio scripts starting...");

        platform::on_ready(move || {
            folio_web::marquee::dom::install(&config.marquee);
            folio_web::menu::install(&config.menu);
            let toggle_grid = folio_web::grid::install(&config.grid);
            folio_web::keynav::install(toggle_grid);
            folio_web::modal::install(&config.modal);
            log::debug!("Page components installed");
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_site::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use folio_web::marquee::{MarqueeSnapshot, RestoreTarget, TapeReading};

    env_logger::init();
    log::info!("Folio Web (native) starting...");
    log::info!("The page scripts only run in the browser - build with `trunk build` for the site");

    // Walk through one capture/restore across all default tapes
    let config = folio_web::SiteConfig::default();
    let table = config.marquee.phase_table();
    let readings = [Some(TapeReading::new(5_000.0)), None, None];
    let Some(snapshot) = MarqueeSnapshot::capture(&table, &readings) else {
        return;
    };
    let shared = snapshot.position(0).unwrap_or(0.0);
    println!("\nShared position: {:.0}ms", shared);
    for index in 0..table.len() {
        let target = RestoreTarget::plan(&table, index, shared);
        println!(
            "  tape {}: elapsed {:.0}ms, animation-delay {}s",
            index, target.elapsed_ms, target.delay_secs
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Started through wasm_main
}
