//! Inspection of fetched documents
//!
//! A fetched response body is parsed once with `scraper` and queried for the
//! page node and the redirect marker. `scraper::Html` is not `Send`, so a
//! [`FetchedDocument`] is built and dropped inside one synchronous step.

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::debug;

/// Attribute carrying the route the server actually answered for
pub const REDIRECT_ATTRIBUTE: &str = "data-url";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

fn selector(raw: &str) -> Result<Selector, DocumentError> {
    Selector::parse(raw).map_err(|e| DocumentError::InvalidSelector {
        selector: raw.to_string(),
        reason: format!("{:?}", e),
    })
}

/// A parsed response body
pub struct FetchedDocument {
    html: Html,
}

impl FetchedDocument {
    /// Parse a full HTML document
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// Parse a markup fragment
    pub fn parse_fragment(body: &str) -> Self {
        Self {
            html: Html::parse_fragment(body),
        }
    }

    /// Outer HTML of the first node matching `sel`
    pub fn select_node(&self, sel: &str) -> Result<Option<String>, DocumentError> {
        let sel = selector(sel)?;
        Ok(self.html.select(&sel).next().map(|el| el.html()))
    }

    /// Whether any node matches `sel`
    pub fn has_node(&self, sel: &str) -> Result<bool, DocumentError> {
        let sel = selector(sel)?;
        Ok(self.html.select(&sel).next().is_some())
    }

    /// Route named by the redirect marker on a direct child of `root`
    pub fn redirect_target(&self, root: &str) -> Result<Option<String>, DocumentError> {
        let sel = selector(&format!("{} > [{}]", root, REDIRECT_ATTRIBUTE))?;
        let target = self
            .html
            .select(&sel)
            .filter_map(|el| el.value().attr(REDIRECT_ATTRIBUTE))
            .map(str::trim)
            .find(|url| !url.is_empty())
            .map(str::to_string);
        debug!(%root, ?target, "FetchedDocument::redirect_target");
        Ok(target)
    }
}
