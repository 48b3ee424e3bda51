//! Single-key shortcuts
//!
//! Arrows step between posts, digits jump to menu items, letters reach the
//! home, stats, random post and grid overlay. Suppressed while typing.

use rand::Rng;

/// What a key press should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavAction {
    Navigate(String),
    RandomPost,
    ToggleGrid,
    CloseMenu,
    FocusSearch,
}

/// Page facts the resolver needs, gathered per key press
#[derive(Debug, Clone, Default)]
pub struct KeyContext {
    /// An input, textarea or contenteditable has focus
    pub typing: bool,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    /// `#navLinks a` hrefs in order
    pub menu_hrefs: Vec<String>,
    pub menu_open: bool,
    pub has_search: bool,
}

pub const HOME_HREF: &str = "/";
pub const STATS_HREF: &str = "/stats/";

fn non_empty(href: &Option<String>) -> Option<String> {
    href.as_ref().filter(|h| !h.is_empty()).cloned()
}

/// Map a `KeyboardEvent.key` to an action
pub fn resolve(key: &str, ctx: &KeyContext) -> Option<NavAction> {
    if ctx.typing {
        return None;
    }

    match key {
        "ArrowLeft" => non_empty(&ctx.previous_href).map(NavAction::Navigate),
        "ArrowRight" => non_empty(&ctx.next_href).map(NavAction::Navigate),
        "h" | "H" => Some(NavAction::Navigate(HOME_HREF.to_string())),
        "s" | "S" => Some(NavAction::Navigate(STATS_HREF.to_string())),
        "r" | "R" => Some(NavAction::RandomPost),
        "g" | "G" => Some(NavAction::ToggleGrid),
        "Escape" if ctx.menu_open => Some(NavAction::CloseMenu),
        "/" if ctx.has_search => Some(NavAction::FocusSearch),
        _ => {
            let digit = key.parse::<usize>().ok().filter(|d| (1..=9).contains(d))?;
            ctx.menu_hrefs
                .get(digit - 1)
                .filter(|h| !h.is_empty())
                .cloned()
                .map(NavAction::Navigate)
        }
    }
}

/// Where a random post can come from, in preference order
#[derive(Debug, Clone, Default)]
pub struct PostSources {
    /// Raw `data-posts` JSON from `#all-posts-data`
    pub posts_json: Option<String>,
    /// `.postCard` hrefs on the current page
    pub card_hrefs: Vec<String>,
    /// Works/blogs index links
    pub index_hrefs: Vec<String>,
}

impl PostSources {
    /// Candidate URLs from the first non-empty source
    pub fn candidates(&self) -> Vec<String> {
        let from_data: Vec<String> = match self.posts_json.as_deref() {
            Some(json) => match serde_json::from_str::<Vec<String>>(json) {
                Ok(urls) => urls,
                Err(e) => {
                    log::error!("Failed to parse post URLs: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        [from_data, self.card_hrefs.clone(), self.index_hrefs.clone()]
            .into_iter()
            .map(|list| list.into_iter().filter(|u| !u.is_empty()).collect::<Vec<_>>())
            .find(|list| !list.is_empty())
            .unwrap_or_default()
    }

    /// Pick one candidate uniformly
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<String> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return None;
        }
        let index = rng.random_range(0..candidates.len());
        candidates.into_iter().nth(index)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::install;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use web_sys::{Document, HtmlAnchorElement, HtmlElement, KeyboardEvent};

    use super::*;
    use crate::platform;

    fn href_of(document: &Document, selector: &str) -> Option<String> {
        document
            .query_selector(selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlAnchorElement>().ok())
            .map(|a| a.href())
    }

    fn hrefs(document: &Document, selector: &str) -> Vec<String> {
        platform::query_document(document, selector)
            .into_iter()
            .filter_map(|el| el.dyn_into::<HtmlAnchorElement>().ok())
            .map(|a| a.href())
            .collect()
    }

    fn is_typing(document: &Document) -> bool {
        let Some(active) = document.active_element() else {
            return false;
        };
        let tag = active.tag_name();
        tag == "INPUT"
            || tag == "TEXTAREA"
            || active
                .dyn_ref::<HtmlElement>()
                .map(|el| el.is_content_editable())
                .unwrap_or(false)
    }

    fn context(document: &Document) -> KeyContext {
        KeyContext {
            typing: is_typing(document),
            previous_href: href_of(document, ".previous.navArrow"),
            next_href: href_of(document, ".next.navArrow"),
            menu_hrefs: hrefs(document, "#navLinks a"),
            menu_open: crate::menu::is_open(document),
            has_search: document.get_element_by_id("search-input").is_some(),
        }
    }

    fn post_sources(document: &Document) -> PostSources {
        let posts_json = document
            .get_element_by_id("all-posts-data")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .and_then(|el| el.dataset().get("posts"));
        let mut index_hrefs = Vec::new();
        index_hrefs.extend(href_of(document, "a[href*=\"/works/\"]"));
        index_hrefs.extend(href_of(document, "a[href*=\"/blogs/\"]"));
        PostSources {
            posts_json,
            card_hrefs: hrefs(document, ".postCard"),
            index_hrefs,
        }
    }

    /// Listen for shortcuts; `toggle_grid` is called for `G`
    pub fn install(toggle_grid: Rc<dyn Fn()>) {
        let Some(document) = platform::document() else {
            return;
        };
        let doc = document.clone();
        platform::listen(&document, "keydown", move |event: KeyboardEvent| {
            let ctx = context(&doc);
            let Some(action) = resolve(&event.key(), &ctx) else {
                return;
            };
            event.prevent_default();
            match action {
                NavAction::Navigate(href) => platform::navigate(&href),
                NavAction::RandomPost => {
                    if let Some(href) = post_sources(&doc).pick(&mut rand::rng()) {
                        platform::navigate(&href);
                    }
                }
                NavAction::ToggleGrid => toggle_grid(),
                NavAction::CloseMenu => crate::menu::close(&doc),
                NavAction::FocusSearch => {
                    if let Some(input) = doc
                        .get_element_by_id("search-input")
                        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
                    {
                        let _ = input.focus();
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ctx() -> KeyContext {
        KeyContext {
            previous_href: Some("/blogs/one/".into()),
            next_href: Some(String::new()),
            menu_hrefs: vec!["/".into(), "/works/".into(), "/blogs/".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_arrows() {
        let c = ctx();
        assert_eq!(resolve("ArrowLeft", &c), Some(NavAction::Navigate("/blogs/one/".into())));
        // Empty href counts as missing
        assert_eq!(resolve("ArrowRight", &c), None);
    }

    #[test]
    fn test_digits() {
        let c = ctx();
        assert_eq!(resolve("2", &c), Some(NavAction::Navigate("/works/".into())));
        assert_eq!(resolve("4", &c), None);
        assert_eq!(resolve("0", &c), None);
        assert_eq!(resolve("10", &c), None);
    }

    #[test]
    fn test_letters_any_case() {
        let c = ctx();
        assert_eq!(resolve("h", &c), Some(NavAction::Navigate("/".into())));
        assert_eq!(resolve("S", &c), Some(NavAction::Navigate("/stats/".into())));
        assert_eq!(resolve("R", &c), Some(NavAction::RandomPost));
        assert_eq!(resolve("g", &c), Some(NavAction::ToggleGrid));
        assert_eq!(resolve("x", &c), None);
    }

    #[test]
    fn test_conditional_keys() {
        let mut c = ctx();
        assert_eq!(resolve("Escape", &c), None);
        assert_eq!(resolve("/", &c), None);
        c.menu_open = true;
        c.has_search = true;
        assert_eq!(resolve("Escape", &c), Some(NavAction::CloseMenu));
        assert_eq!(resolve("/", &c), Some(NavAction::FocusSearch));
    }

    #[test]
    fn test_typing_suppresses_everything() {
        let mut c = ctx();
        c.typing = true;
        c.menu_open = true;
        for key in ["ArrowLeft", "1", "h", "r", "g", "Escape", "/"] {
            assert_eq!(resolve(key, &c), None, "{key}");
        }
    }

    #[test]
    fn test_random_post_source_order() {
        let sources = PostSources {
            posts_json: Some(r#"["/blogs/a/","/works/b/"]"#.into()),
            card_hrefs: vec!["/card/".into()],
            index_hrefs: vec!["/works/".into()],
        };
        assert_eq!(sources.candidates(), vec!["/blogs/a/", "/works/b/"]);

        let cards = PostSources {
            posts_json: Some("not json".into()),
            card_hrefs: vec!["".into(), "/card/".into()],
            index_hrefs: vec!["/works/".into()],
        };
        assert_eq!(cards.candidates(), vec!["/card/"]);

        let index = PostSources {
            index_hrefs: vec!["/works/".into(), "/blogs/".into()],
            ..Default::default()
        };
        assert_eq!(index.candidates().len(), 2);
        assert!(PostSources::default().candidates().is_empty());
    }

    #[test]
    fn test_pick_is_from_candidates() {
        let sources = PostSources {
            posts_json: Some(r#"["/a/","/b/","/c/"]"#.into()),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let pick = sources.pick(&mut rng).unwrap();
            assert!(["/a/", "/b/", "/c/"].contains(&pick.as_str()));
        }
        assert_eq!(PostSources::default().pick(&mut rng), None);
    }
}
