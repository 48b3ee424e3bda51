//! Browser wiring for the marquee persistor

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlElement};

use super::snapshot::{TapeReading, storage_key};
use super::sync::{RestoreBatch, SaveOutcome, TapeDeck, TapeSync};
use crate::persistence::BrowserStore;
use crate::platform;
use crate::settings::MarqueeConfig;

/// Animated inner strips of every `.tape` container, by ordinal
pub struct DomTapeDeck {
    inners: Vec<Option<HtmlElement>>,
}

impl DomTapeDeck {
    pub fn find(document: &web_sys::Document, config: &MarqueeConfig) -> Self {
        let inners = platform::query_document(document, &config.container_selector)
            .into_iter()
            .map(|tape| {
                tape.query_selector(&config.inner_selector)
                    .ok()
                    .flatten()
                    .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            })
            .collect();
        Self { inners }
    }

    fn inner(&self, index: usize) -> Option<&HtmlElement> {
        self.inners.get(index).and_then(|el| el.as_ref())
    }
}

/// `element.getAnimations()[0]`, tolerating browsers without the API
fn first_animation(element: &Element) -> Option<JsValue> {
    let get = Reflect::get(element, &JsValue::from_str("getAnimations")).ok()?;
    let get: Function = get.dyn_into().ok()?;
    let list: Array = get.call0(element).ok()?.dyn_into().ok()?;
    let animation = list.get(0);
    if animation.is_undefined() || animation.is_null() {
        None
    } else {
        Some(animation)
    }
}

/// `animation.effect.getTiming()`
fn effect_timing(animation: &JsValue) -> Option<JsValue> {
    let effect = Reflect::get(animation, &JsValue::from_str("effect")).ok()?;
    if effect.is_null() || effect.is_undefined() {
        return None;
    }
    let get_timing: Function = Reflect::get(&effect, &JsValue::from_str("getTiming"))
        .ok()?
        .dyn_into()
        .ok()?;
    get_timing.call0(&effect).ok()
}

fn timing_number(timing: &JsValue, field: &str) -> Option<f64> {
    Reflect::get(timing, &JsValue::from_str(field)).ok()?.as_f64()
}

impl TapeDeck for DomTapeDeck {
    fn len(&self) -> usize {
        self.inners.len()
    }

    fn read(&self, index: usize) -> Option<TapeReading> {
        let inner = self.inner(index)?;
        let animation = first_animation(inner)?;
        // Paused or pending animations report null; treat as the loop start
        let current = Reflect::get(&animation, &JsValue::from_str("currentTime"))
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let mut reading = TapeReading::new(current);
        if let Some(timing) = effect_timing(&animation) {
            // A restored tape carries its phase in the delay, not in currentTime
            if let Some(delay) = timing_number(&timing, "delay") {
                reading = reading.with_delay(delay);
            }
            // "auto" is not a number; the cycle length applies then
            if let Some(duration) = timing_number(&timing, "duration") {
                reading = reading.with_duration(duration);
            }
        }
        Some(reading)
    }

    fn is_animating(&self, index: usize) -> bool {
        let Some(inner) = self.inner(index) else {
            return false;
        };
        if first_animation(inner).is_some() {
            return true;
        }
        matches!(
            platform::computed_property(inner, "animation-name").as_deref(),
            Some(name) if name != "none"
        )
    }

    fn apply_delay(&mut self, index: usize, delay_secs: f64) {
        let Some(inner) = self.inner(index) else {
            return;
        };
        let name = platform::computed_property(inner, "animation-name")
            .unwrap_or_else(|| "none".to_string());
        let duration = platform::computed_property(inner, "animation-duration")
            .unwrap_or_else(|| "30s".to_string());
        let timing = platform::computed_property(inner, "animation-timing-function")
            .unwrap_or_else(|| "linear".to_string());
        let iterations = platform::computed_property(inner, "animation-iteration-count")
            .unwrap_or_else(|| "infinite".to_string());

        let style = inner.style();
        let _ = style.set_property("animation", "none");
        // Reading layout forces a reflow so the restart takes effect
        let _ = inner.offset_height();
        let _ = style.set_property(
            "animation",
            &format!("{} {} {} {}s {}", name, duration, timing, delay_secs, iterations),
        );
    }
}

/// Persistor instance owned by the page's callbacks
pub struct MarqueePersistor {
    sync: TapeSync<BrowserStore>,
    deck: DomTapeDeck,
    restore: Option<RestoreBatch>,
}

impl MarqueePersistor {
    fn save(&mut self, trigger: &str) {
        match self.sync.save(&self.deck, self.restore.as_ref()) {
            SaveOutcome::Saved(n) => log::trace!("Saved {} tape positions ({})", n, trigger),
            SaveOutcome::Skipped => log::trace!("No running tapes to save ({})", trigger),
            SaveOutcome::Failed => {}
        }
    }

    /// One restore attempt; true while tapes are still waiting
    fn step_restore(&mut self) -> bool {
        match self.restore.as_mut() {
            Some(batch) => batch.step(&mut self.deck),
            None => false,
        }
    }

    fn next_restore_delay_ms(&self) -> Option<u32> {
        self.restore.as_ref()?.next_delay_ms()
    }
}

/// Find the tapes, restore their saved phase, and keep saving it
pub fn install(config: &MarqueeConfig) {
    let Some(document) = platform::document() else {
        return;
    };
    let deck = DomTapeDeck::find(&document, config);
    if deck.is_empty() {
        return;
    }

    let store = match BrowserStore::session() {
        Ok(store) => store,
        Err(e) => {
            log::info!("Marquee state disabled: {}", e);
            return;
        }
    };

    let key = storage_key(&config.storage_key, config.key_per_page, &platform::pathname());
    let sync = TapeSync::new(config.phase_table(), config.retry_schedule(), key, store);
    sync.check_layout(deck.len());

    let restore = sync.begin_restore(deck.len());
    if let Some(batch) = &restore {
        log::debug!("Restoring {} of {} tapes", batch.targets().count(), deck.len());
    }
    let persistor = Rc::new(RefCell::new(MarqueePersistor { sync, deck, restore }));

    // Periodic save
    {
        let persistor = persistor.clone();
        platform::set_interval(config.save_interval_ms, move || {
            persistor.borrow_mut().save("interval");
        });
    }

    // Leaving the page
    if let Some(window) = platform::window() {
        for event in ["beforeunload", "pagehide"] {
            let persistor = persistor.clone();
            platform::listen(&window, event, move |_event: web_sys::Event| {
                persistor.borrow_mut().save(event);
            });
        }
    }

    // Tab hidden
    {
        let persistor = persistor.clone();
        let document_clone = document.clone();
        platform::listen(&document, "visibilitychange", move |_event: web_sys::Event| {
            if platform::is_hidden(&document_clone) {
                persistor.borrow_mut().save("hidden");
            }
        });
    }

    schedule_restore(persistor);
}

fn schedule_restore(persistor: Rc<RefCell<MarqueePersistor>>) {
    let Some(delay) = persistor.borrow().next_restore_delay_ms() else {
        return;
    };
    platform::set_timeout(delay, move || {
        let more = persistor.borrow_mut().step_restore();
        if more {
            schedule_restore(persistor);
        }
    });
}
