//! Full-size image viewer for post images
//!
//! Clicking a `.postPageImg` opens it in a dimmed overlay. The overlay fades
//! via an `active` class added just after it is displayed and removed before
//! it is hidden again.

/// Overlay lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    Closed,
    /// Displayed, fade-in pending
    Opening,
    Open,
    /// Fading out, hide pending
    Closing,
}

impl ModalState {
    /// Request to open; returns false if already opening/open
    pub fn open(&mut self) -> bool {
        match self {
            ModalState::Closed | ModalState::Closing => {
                *self = ModalState::Opening;
                true
            }
            ModalState::Opening | ModalState::Open => false,
        }
    }

    /// Fade-in timer fired
    pub fn opened(&mut self) {
        if *self == ModalState::Opening {
            *self = ModalState::Open;
        }
    }

    /// Request to close; returns false if nothing is showing
    pub fn close(&mut self) -> bool {
        match self {
            ModalState::Opening | ModalState::Open => {
                *self = ModalState::Closing;
                true
            }
            ModalState::Closed | ModalState::Closing => false,
        }
    }

    /// Hide timer fired; returns true if the overlay should be hidden now
    pub fn closed(&mut self) -> bool {
        if *self == ModalState::Closing {
            *self = ModalState::Closed;
            true
        } else {
            false
        }
    }

    /// `Escape` only acts on a fully open modal
    pub fn accepts_escape(&self) -> bool {
        *self == ModalState::Open
    }
}

/// Injected once per page
pub const MODAL_CSS: &str = r#"
@keyframes imageModalFadeIn {
    from { opacity: 0; transform: scale(0.9); }
    to { opacity: 1; transform: scale(1); }
}
.image-modal.active { display: flex !important; opacity: 1 !important; }
.image-modal-content { cursor: pointer; }
.postPageImg { cursor: zoom-in; transition: transform 0.2s ease; }
.postPageImg:hover { transform: scale(1.02); }
@media (max-width: 1024px) {
    .image-modal-img { max-width: 100vw; max-height: 100vh; }
    .image-modal-close { top: 10px; right: 10px; background: rgba(16, 70, 38, 0.9); }
}
"#;

#[cfg(target_arch = "wasm32")]
pub use web::install;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use web_sys::{Document, EventTarget, HtmlElement, HtmlImageElement, KeyboardEvent, MouseEvent};

    use super::*;
    use crate::platform;
    use crate::settings::ModalConfig;

    const STYLE_ID: &str = "image-modal-styles";

    struct Modal {
        state: ModalState,
        overlay: HtmlElement,
        content: HtmlElement,
        image: HtmlImageElement,
        document: Document,
        config: ModalConfig,
    }

    type Shared = Rc<RefCell<Modal>>;

    fn html(document: &Document, tag: &str, class: &str) -> Option<HtmlElement> {
        let el: HtmlElement = document.create_element(tag).ok()?.dyn_into().ok()?;
        el.set_class_name(class);
        Some(el)
    }

    fn inject_styles(document: &Document) {
        if document.get_element_by_id(STYLE_ID).is_some() {
            return;
        }
        let Some(head) = document.head() else {
            return;
        };
        if let Ok(style) = document.create_element("style") {
            style.set_id(STYLE_ID);
            style.set_text_content(Some(MODAL_CSS));
            let _ = head.append_child(&style);
        }
    }

    fn build(document: &Document, config: &ModalConfig) -> Option<Modal> {
        let overlay = html(document, "div", "image-modal")?;
        overlay.set_id("image-modal");
        platform::set_styles(
            &overlay,
            &[
                ("display", "none"),
                ("position", "fixed"),
                ("top", "0"),
                ("left", "0"),
                ("width", "100%"),
                ("height", "100%"),
                ("background-color", "rgba(0, 0, 0, 0.85)"),
                ("z-index", "10000"),
                ("justify-content", "center"),
                ("align-items", "center"),
                ("opacity", "0"),
                ("transition", "opacity 0.3s ease"),
            ],
        );

        let content = html(document, "div", "image-modal-content")?;
        platform::set_styles(
            &content,
            &[
                ("position", "relative"),
                ("max-width", "95vw"),
                ("max-height", "95vh"),
                ("display", "flex"),
                ("justify-content", "center"),
                ("align-items", "center"),
            ],
        );

        let image: HtmlImageElement = html(document, "img", "image-modal-img")?.dyn_into().ok()?;
        platform::set_styles(
            &image,
            &[
                ("max-width", "100%"),
                ("max-height", "95vh"),
                ("width", "auto"),
                ("height", "auto"),
                ("object-fit", "contain"),
                ("box-shadow", "0 0 30px rgba(0, 0, 0, 0.5)"),
                ("animation", "imageModalFadeIn 0.3s ease"),
            ],
        );

        let close = html(document, "button", "image-modal-close")?;
        close.set_text_content(Some("\u{d7}"));
        let _ = close.set_attribute("aria-label", "Close image");
        platform::set_styles(
            &close,
            &[
                ("position", "absolute"),
                ("top", "-40px"),
                ("right", "0"),
                ("background", "#104626"),
                ("color", "#FCBE11"),
                ("border", "3px solid #104626"),
                ("font-size", "2rem"),
                ("width", "40px"),
                ("height", "40px"),
                ("cursor", "pointer"),
                ("font-family", "\"Times New Roman\", serif"),
                ("font-weight", "bold"),
                ("display", "flex"),
                ("align-items", "center"),
                ("justify-content", "center"),
                ("line-height", "1"),
                ("z-index", "10001"),
            ],
        );

        content.append_child(&image).ok()?;
        content.append_child(&close).ok()?;
        overlay.append_child(&content).ok()?;
        document.body()?.append_child(&overlay).ok()?;

        let modal = Modal {
            state: ModalState::Closed,
            overlay,
            content,
            image,
            document: document.clone(),
            config: config.clone(),
        };
        Some(modal)
    }

    fn open(modal: &Shared, src: &str) {
        let delay = {
            let mut m = modal.borrow_mut();
            if !m.state.open() {
                return;
            }
            m.image.set_src(src);
            let _ = m.overlay.style().set_property("display", "flex");
            platform::lock_body_scroll(&m.document, true, false);
            m.config.open_delay_ms
        };
        let modal = modal.clone();
        platform::set_timeout(delay, move || {
            let mut m = modal.borrow_mut();
            if m.state == ModalState::Opening {
                let _ = m.overlay.class_list().add_1("active");
                m.state.opened();
            }
        });
    }

    fn close(modal: &Shared) {
        let delay = {
            let mut m = modal.borrow_mut();
            if !m.state.close() {
                return;
            }
            let _ = m.overlay.class_list().remove_1("active");
            m.config.close_delay_ms
        };
        let modal = modal.clone();
        platform::set_timeout(delay, move || {
            let mut m = modal.borrow_mut();
            if m.state.closed() {
                let _ = m.overlay.style().set_property("display", "none");
                platform::lock_body_scroll(&m.document, false, false);
            }
        });
    }

    fn is_target(event: &MouseEvent, el: &EventTarget) -> bool {
        event.target().as_ref() == Some(el)
    }

    pub fn install(config: &ModalConfig) {
        let Some(document) = platform::document() else {
            return;
        };
        inject_styles(&document);
        let Some(modal) = build(&document, config) else {
            log::warn!("Image modal could not be built");
            return;
        };
        let modal: Shared = Rc::new(RefCell::new(modal));
        let (overlay, content, image) = {
            let m = modal.borrow();
            (m.overlay.clone(), m.content.clone(), m.image.clone())
        };

        if let Some(button) = content.query_selector(".image-modal-close").ok().flatten() {
            let modal = modal.clone();
            platform::listen(&button, "click", move |event: MouseEvent| {
                event.stop_propagation();
                close(&modal);
            });
        }

        {
            let modal = modal.clone();
            let content_target: EventTarget = content.clone().into();
            let image_target: EventTarget = image.clone().into();
            platform::listen(&content, "click", move |event: MouseEvent| {
                if is_target(&event, &content_target) || is_target(&event, &image_target) {
                    close(&modal);
                }
            });
        }

        {
            let modal = modal.clone();
            let overlay_target: EventTarget = overlay.clone().into();
            platform::listen(&overlay, "click", move |event: MouseEvent| {
                if is_target(&event, &overlay_target) {
                    close(&modal);
                }
            });
        }

        {
            let modal = modal.clone();
            platform::listen(&document, "keydown", move |event: KeyboardEvent| {
                let open = modal.borrow().state.accepts_escape();
                if event.key() == "Escape" && open {
                    close(&modal);
                }
            });
        }

        // Post images present once the DOM is parsed
        let doc = document.clone();
        platform::on_ready(move || {
            for img in platform::query_document(&doc, ".postPageImg") {
                let Ok(img) = img.dyn_into::<HtmlImageElement>() else {
                    continue;
                };
                let modal = modal.clone();
                let source = img.clone();
                platform::listen(&img, "click", move |event: MouseEvent| {
                    event.prevent_default();
                    open(&modal, &source.src());
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close_cycle() {
        let mut state = ModalState::default();
        assert!(!state.close());
        assert!(state.open());
        assert!(!state.open());
        assert!(!state.accepts_escape());
        state.opened();
        assert_eq!(state, ModalState::Open);
        assert!(state.accepts_escape());

        assert!(state.close());
        assert!(!state.close());
        assert!(state.closed());
        assert_eq!(state, ModalState::Closed);
    }

    #[test]
    fn test_reopen_while_closing_cancels_hide() {
        let mut state = ModalState::Open;
        state.close();
        assert!(state.open());
        // The pending hide timer must not hide a reopened modal
        assert!(!state.closed());
        state.opened();
        assert_eq!(state, ModalState::Open);
    }

    #[test]
    fn test_stale_fade_in_after_close() {
        let mut state = ModalState::Closed;
        state.open();
        state.close();
        state.opened();
        assert_eq!(state, ModalState::Closing);
    }
}
