//! PageRegistry - resolves routes to pages

use tracing::{debug, warn};

use super::route::{RouteError, RoutePattern};
use super::PageRef;

struct Entry {
    page: PageRef,
    patterns: Vec<RoutePattern>,
}

/// Registered pages, in registration order
#[derive(Default)]
pub struct PageRegistry {
    entries: Vec<Entry>,
    pages: Vec<PageRef>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page, compiling its route patterns
    pub fn register(&mut self, page: PageRef) -> Result<(), RouteError> {
        debug!(key = %page.key(), routes = ?page.routes(), "PageRegistry::register: called");
        let patterns = page
            .routes()
            .iter()
            .map(|r| RoutePattern::parse(r))
            .collect::<Result<Vec<_>, _>>()?;

        self.pages.push(page.clone());
        self.entries.push(Entry { page, patterns });
        Ok(())
    }

    /// First registered page with a route matching `route`
    pub fn page_for_route(&self, route: &str) -> Option<PageRef> {
        let found = self
            .entries
            .iter()
            .find(|e| e.patterns.iter().any(|p| p.matches(route)))
            .map(|e| e.page.clone());
        debug!(%route, found = ?found.as_ref().map(|p| p.key().to_string()), "PageRegistry::page_for_route");
        found
    }

    /// All registered pages
    pub fn instances(&self) -> &[PageRef] {
        &self.pages
    }

    /// Index of the first pattern in `patterns` matching `url`
    ///
    /// Patterns that fail to compile are skipped.
    pub fn match_route(url: &str, patterns: &[String]) -> Option<usize> {
        patterns.iter().position(|raw| match RoutePattern::parse(raw) {
            Ok(pattern) => pattern.matches(url),
            Err(e) => {
                warn!(pattern = %raw, error = %e, "Skipping invalid route pattern");
                false
            }
        })
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
