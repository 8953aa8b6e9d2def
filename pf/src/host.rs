//! The live document pages are swapped into

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::document::FetchedDocument;

/// The host document as seen by the mediator
pub trait Host: Send + Sync {
    /// URL currently shown
    fn current_url(&self) -> String;

    /// Whether a node matches `selector`
    fn has_node(&self, selector: &str) -> bool;

    /// Append a fetched page node (hidden) under the root element
    fn append(&self, page_key: &str, node: &str);
}

/// In-memory host: initial markup plus the nodes appended since
pub struct MemoryHost {
    url: Mutex<String>,
    markup: String,
    appended: Mutex<Vec<(String, String)>>,
}

impl MemoryHost {
    pub fn new(url: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            url: Mutex::new(url.into()),
            markup: markup.into(),
            appended: Mutex::new(Vec::new()),
        }
    }

    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.lock().unwrap_or_else(|e| e.into_inner()) = url.into();
    }

    /// Appended `(page key, node)` pairs, in order
    pub fn appended(&self) -> Vec<(String, String)> {
        self.appended.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Host for MemoryHost {
    fn current_url(&self) -> String {
        self.url.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn has_node(&self, selector: &str) -> bool {
        let appended = self.appended.lock().unwrap_or_else(|e| e.into_inner());
        let markup = appended.iter().fold(self.markup.clone(), |mut acc, (_, node)| {
            acc.push_str(node);
            acc
        });
        drop(appended);

        match FetchedDocument::parse(&markup).has_node(selector) {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "MemoryHost::has_node: invalid selector");
                false
            }
        }
    }

    fn append(&self, page_key: &str, node: &str) {
        debug!(%page_key, "MemoryHost::append: called");
        self.appended
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((page_key.to_string(), node.to_string()));
    }
}
