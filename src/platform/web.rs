use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::convert::FromWasmAbi;
use web_sys::{Document, Element, EventTarget, HtmlElement, VisibilityState, Window};

pub fn window() -> Option<Window> {
    web_sys::window()
}

pub fn document() -> Option<Document> {
    window()?.document()
}

/// Current `location.pathname`, empty if unavailable
pub fn pathname() -> String {
    window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_default()
}

/// Current `window.innerWidth` in CSS pixels
pub fn inner_width() -> f64 {
    window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

/// Navigate the current tab
pub fn navigate(href: &str) {
    if let Some(window) = window() {
        if let Err(e) = window.location().set_href(href) {
            log::warn!("Navigation to {} failed: {:?}", href, e);
        }
    }
}

/// Run `f` once after `ms` milliseconds
pub fn set_timeout<F>(ms: u32, f: F)
where
    F: FnOnce() + 'static,
{
    let Some(window) = window() else {
        return;
    };
    let closure = Closure::once(f);
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        ms as i32,
    );
    closure.forget();
}

/// Run `f` every `ms` milliseconds for the lifetime of the page
pub fn set_interval<F>(ms: u32, f: F)
where
    F: FnMut() + 'static,
{
    let Some(window) = window() else {
        return;
    };
    let closure = Closure::<dyn FnMut()>::new(f);
    let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        ms as i32,
    );
    closure.forget();
}

/// Attach `handler` to `event` on `target` for the lifetime of the page
pub fn listen<E, F>(target: &EventTarget, event: &str, handler: F)
where
    E: FromWasmAbi + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    if let Err(e) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        log::warn!("Failed to listen for {}: {:?}", event, e);
    }
    closure.forget();
}

/// True when the tab is in the background
pub fn is_hidden(document: &Document) -> bool {
    document.visibility_state() == VisibilityState::Hidden
}

/// Run `f` once the DOM is parsed (immediately if it already is)
pub fn on_ready<F>(f: F)
where
    F: FnOnce() + 'static,
{
    let Some(document) = document() else {
        return;
    };
    if document.ready_state() == "loading" {
        let mut f = Some(f);
        listen(&document, "DOMContentLoaded", move |_event: web_sys::Event| {
            if let Some(f) = f.take() {
                f();
            }
        });
    } else {
        f();
    }
}

/// Document-wide `querySelectorAll`
pub fn query_document(document: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Computed value of a CSS property, `None` when empty
pub fn computed_property(element: &Element, property: &str) -> Option<String> {
    let style = window()?.get_computed_style(element).ok()??;
    let value = style.get_property_value(property).ok()?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Set several inline style properties at once
pub fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) {
    let style = element.style();
    for (property, value) in styles {
        let _ = style.set_property(property, value);
    }
}

/// Lock or release page scrolling on `<body>`
pub fn lock_body_scroll(document: &Document, locked: bool, pin: bool) {
    let Some(body) = document.body() else {
        return;
    };
    let style = body.style();
    let _ = style.set_property("overflow", if locked { "hidden" } else { "" });
    if pin {
        let _ = style.set_property("position", if locked { "fixed" } else { "" });
        let _ = style.set_property("width", if locked { "100%" } else { "" });
    }
}
