//! Design grid overlay
//!
//! A fixed, click-through SVG grid over the whole viewport. Visibility is
//! remembered in LocalStorage.

use crate::persistence::{KeyValueStore, StoreError};

/// LocalStorage key
pub const STORAGE_KEY: &str = "grid-overlay-visible";

/// Overlay visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridOverlay {
    visible: bool,
}

impl GridOverlay {
    /// Only the exact string `"true"` means visible
    pub fn from_stored(value: Option<&str>) -> Self {
        Self {
            visible: value == Some("true"),
        }
    }

    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        match store.get(STORAGE_KEY) {
            Ok(value) => Self::from_stored(value.as_deref()),
            Err(e) => {
                log::debug!("Grid preference unreadable: {}", e);
                Self::default()
            }
        }
    }

    pub fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<(), StoreError> {
        store.set(STORAGE_KEY, if self.visible { "true" } else { "false" })
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn display(&self) -> &'static str {
        if self.visible { "block" } else { "none" }
    }
}

/// SVG path for one grid cell's top and left edges
pub fn cell_path(cell_px: u32) -> String {
    format!("M {} 0 L 0 0 0 {}", cell_px, cell_px)
}

#[cfg(target_arch = "wasm32")]
pub use web::install;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::{Document, Element, HtmlElement};

    use super::*;
    use crate::persistence::BrowserStore;
    use crate::platform;
    use crate::settings::GridConfig;

    const SVG_NS: &str = "http://www.w3.org/2000/svg";

    fn svg(document: &Document, tag: &str, attrs: &[(&str, &str)]) -> Option<Element> {
        let el = document.create_element_ns(Some(SVG_NS), tag).ok()?;
        for (name, value) in attrs {
            let _ = el.set_attribute(name, value);
        }
        Some(el)
    }

    fn build(document: &Document, config: &GridConfig) -> Option<HtmlElement> {
        let overlay: HtmlElement = document.create_element("div").ok()?.dyn_into().ok()?;
        overlay.set_id("grid-overlay");
        let opacity = config.opacity.to_string();
        platform::set_styles(
            &overlay,
            &[
                ("position", "fixed"),
                ("top", "0"),
                ("left", "0"),
                ("width", "100%"),
                ("height", "100%"),
                ("pointer-events", "none"),
                ("z-index", "9999"),
                ("display", "none"),
                ("opacity", opacity.as_str()),
            ],
        );

        let size = config.cell_px.to_string();
        let root = svg(
            document,
            "svg",
            &[
                ("width", "100%"),
                ("height", "100%"),
                ("style", "position: absolute; top: 0; left: 0;"),
            ],
        )?;
        let defs = svg(document, "defs", &[])?;
        let pattern = svg(
            document,
            "pattern",
            &[
                ("id", "grid"),
                ("width", size.as_str()),
                ("height", size.as_str()),
                ("patternUnits", "userSpaceOnUse"),
            ],
        )?;
        let path = svg(
            document,
            "path",
            &[
                ("d", cell_path(config.cell_px).as_str()),
                ("fill", "none"),
                ("stroke", config.stroke.as_str()),
                ("stroke-width", "1"),
            ],
        )?;
        let rect = svg(
            document,
            "rect",
            &[("width", "100%"), ("height", "100%"), ("fill", "url(#grid)")],
        )?;

        pattern.append_child(&path).ok()?;
        defs.append_child(&pattern).ok()?;
        root.append_child(&defs).ok()?;
        root.append_child(&rect).ok()?;
        overlay.append_child(&root).ok()?;
        Some(overlay)
    }

    /// Build the overlay, restore its visibility, and return the toggle.
    /// The toggle is also exposed as `window.toggleGridOverlay`.
    pub fn install(config: &GridConfig) -> Rc<dyn Fn()> {
        let noop: Rc<dyn Fn()> = Rc::new(|| {});
        let Some(document) = platform::document() else {
            return noop;
        };
        let (Some(body), Some(overlay)) = (document.body(), build(&document, config)) else {
            return noop;
        };
        if body.append_child(&overlay).is_err() {
            return noop;
        }

        let store = BrowserStore::local().ok();
        let state = store.as_ref().map(GridOverlay::load).unwrap_or_default();
        let _ = overlay.style().set_property("display", state.display());

        let shared = Rc::new(RefCell::new((state, store)));
        let toggle: Rc<dyn Fn()> = Rc::new(move || {
            let mut guard = shared.borrow_mut();
            let (state, store) = &mut *guard;
            state.toggle();
            let _ = overlay.style().set_property("display", state.display());
            if let Some(store) = store {
                if let Err(e) = state.save(store) {
                    log::debug!("Grid preference not saved: {}", e);
                }
            }
        });

        if let Some(window) = platform::window() {
            let exported = toggle.clone();
            let closure = Closure::<dyn Fn()>::new(move || exported());
            let _ = js_sys::Reflect::set(
                &window,
                &"toggleGridOverlay".into(),
                closure.as_ref(),
            );
            closure.forget();
        }

        toggle
    }
}
