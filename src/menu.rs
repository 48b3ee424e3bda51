//! Mobile sidebar menu
//!
//! Below the breakpoint a toggle button opens the `<aside>` as a full-screen
//! menu and pins the body so the page behind it can't scroll.

/// Open/closed state of the sidebar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuState {
    open: bool,
}

impl MenuState {
    pub fn new(open: bool) -> Self {
        Self { open }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flip the menu, returning the new open state
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Close the menu; returns true if it was open
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }
}

/// Mobile layout: the toggle button shows and nav clicks close the menu
pub fn is_narrow(width: f64, breakpoint: f64) -> bool {
    width <= breakpoint
}

#[cfg(target_arch = "wasm32")]
pub use web::{close, install, is_open};

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Element, HtmlElement, MouseEvent, Node};

    use super::*;
    use crate::platform;
    use crate::settings::MenuConfig;

    const OPEN_CLASS: &str = "menu-open";
    const BUTTON_ID: &str = "menu-toggle";

    fn aside(document: &Document) -> Option<Element> {
        document.query_selector("aside").ok().flatten()
    }

    /// Read the current state back from the DOM
    fn state(document: &Document) -> MenuState {
        MenuState::new(
            aside(document)
                .map(|a| a.class_list().contains(OPEN_CLASS))
                .unwrap_or(false),
        )
    }

    /// Write `state` to the aside, button and body
    fn apply(document: &Document, state: MenuState) {
        let open = state.is_open();
        if let Some(aside) = aside(document) {
            let _ = aside.class_list().toggle_with_force(OPEN_CLASS, open);
        }
        if let Some(button) = document.get_element_by_id(BUTTON_ID) {
            let _ = button.class_list().toggle_with_force("active", open);
        }
        if let Some(body) = document.body() {
            let _ = body.class_list().toggle_with_force("menu-active", open);
        }
        platform::lock_body_scroll(document, open, true);
    }

    pub fn is_open(document: &Document) -> bool {
        state(document).is_open()
    }

    pub fn close(document: &Document) {
        let mut s = state(document);
        if s.close() {
            apply(document, s);
        }
    }

    fn update_button(button: &HtmlElement, breakpoint: f64) {
        let visible = is_narrow(platform::inner_width(), breakpoint);
        platform::set_styles(
            button,
            &[
                ("display", if visible { "flex" } else { "none" }),
                ("visibility", if visible { "visible" } else { "hidden" }),
            ],
        );
    }

    fn contains(container: &Element, target: Option<&Node>) -> bool {
        container.contains(target)
    }

    pub fn install(config: &MenuConfig) {
        let Some(document) = platform::document() else {
            return;
        };
        let breakpoint = config.breakpoint_px;
        let button = document
            .get_element_by_id(BUTTON_ID)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());

        if let Some(button) = &button {
            update_button(button, breakpoint);
            if let Some(window) = platform::window() {
                let button = button.clone();
                platform::listen(&window, "resize", move |_event: web_sys::Event| {
                    update_button(&button, breakpoint);
                });
            }
        }

        let (Some(button), Some(aside)) = (button, aside(&document)) else {
            return;
        };

        {
            let doc = document.clone();
            platform::listen(&button, "click", move |event: MouseEvent| {
                event.stop_propagation();
                let mut s = state(&doc);
                s.toggle();
                apply(&doc, s);
            });
        }

        // Outside click closes
        {
            let doc = document.clone();
            let button = button.clone();
            platform::listen(&document, "click", move |event: MouseEvent| {
                let target = event.target().and_then(|t| t.dyn_into::<Node>().ok());
                if is_open(&doc)
                    && !contains(&aside, target.as_ref())
                    && !contains(&button, target.as_ref())
                {
                    close(&doc);
                }
            });
        }

        for link in platform::query_document(&document, "#navLinks a") {
            let doc = document.clone();
            platform::listen(&link, "click", move |_event: MouseEvent| {
                if is_narrow(platform::inner_width(), breakpoint) {
                    close(&doc);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_close() {
        let mut menu = MenuState::default();
        assert!(!menu.is_open());
        assert!(menu.toggle());
        assert!(menu.close());
        assert!(!menu.close());
        assert!(!menu.is_open());
    }

    #[test]
    fn test_breakpoint_inclusive() {
        assert!(is_narrow(1024.0, 1024.0));
        assert!(is_narrow(375.0, 1024.0));
        assert!(!is_narrow(1025.0, 1024.0));
    }
}
