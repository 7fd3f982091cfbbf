//! Stateless page controllers: navbar scroll effect and channel search

use tracing::debug;
use url::Url;

/// Scroll offset past which the navbar gets its `scrolled` class
pub const NAVBAR_SCROLL_THRESHOLD: f64 = 10.0;

/// Path of the channel-search page
pub const SEARCH_PATH: &str = "/search/";

/// Toggles the navbar's `scrolled` class from the page scroll position
#[derive(Debug, Default)]
pub struct NavbarController {
    scrolled: bool,
}

impl NavbarController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a scroll position; returns whether the `scrolled` class applies
    pub fn on_scroll(&mut self, offset_px: f64) -> bool {
        let scrolled = offset_px > NAVBAR_SCROLL_THRESHOLD;
        if scrolled != self.scrolled {
            debug!(offset_px, scrolled, "navbar scroll class toggled");
        }
        self.scrolled = scrolled;
        self.scrolled
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }
}

/// Builds the search redirect from the search input
#[derive(Debug, Default)]
pub struct SearchController;

impl SearchController {
    pub fn new() -> Self {
        Self
    }

    /// Redirect path for a query, percent-encoded; `None` for blank input
    pub fn search_path(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        Some(format!("{SEARCH_PATH}?q={}", urlencoding::encode(query)))
    }

    /// Absolute redirect URL for a query against the site base
    pub fn search_url(&self, base: &Url, query: &str) -> Option<Url> {
        let path = self.search_path(query)?;
        base.join(&path).ok()
    }

    /// Enter in the search input triggers the redirect
    pub fn on_enter(&self, current_value: &str) -> Option<String> {
        self.search_path(current_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navbar_toggles_past_threshold() {
        let mut navbar = NavbarController::new();
        assert!(!navbar.is_scrolled());

        assert!(!navbar.on_scroll(10.0));
        assert!(navbar.on_scroll(10.5));
        assert!(navbar.is_scrolled());
        assert!(!navbar.on_scroll(0.0));
        assert!(!navbar.is_scrolled());
    }

    #[test]
    fn search_percent_encodes_query() {
        let search = SearchController::new();
        assert_eq!(
            search.search_path("canal norte").as_deref(),
            Some("/search/?q=canal%20norte")
        );
        assert_eq!(
            search.search_path("a&b=c").as_deref(),
            Some("/search/?q=a%26b%3Dc")
        );
    }

    #[test]
    fn blank_queries_do_not_redirect() {
        let search = SearchController::new();
        assert_eq!(search.search_path(""), None);
        assert_eq!(search.search_path("   "), None);
        assert_eq!(search.on_enter("\t"), None);
    }

    #[test]
    fn search_url_joins_site_base() {
        let search = SearchController::new();
        let base = Url::parse("https://kaircam.tv/stream/norte").unwrap();
        let url = search.search_url(&base, "música").unwrap();
        assert_eq!(url.as_str(), "https://kaircam.tv/search/?q=m%C3%BAsica");
    }
}
