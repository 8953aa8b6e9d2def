//! Navigation state owned by the Mediator

use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::page::PageRef;

/// Phase of the navigation in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// No navigation in flight
    #[default]
    Idle,
    /// Waiting for the loader
    Loading,
    /// Inspecting the fetched document
    Resolving,
    /// Leaving the current page and entering the next
    LeaveEnter,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Resolving => "resolving",
            Self::LeaveEnter => "leave-enter",
        };
        write!(f, "{}", s)
    }
}

/// The mediator's single owned state
///
/// `current_page` is `None` between leave and enter of a navigation; no
/// interaction with pages is possible in that window.
#[derive(Debug, Clone)]
pub struct MediatorState {
    current_page: Option<PageRef>,
    previous_page: Option<PageRef>,
    previous_url: String,
    is_loading_page: bool,
    root_selector: String,
}

impl MediatorState {
    pub fn new(root_selector: impl Into<String>) -> Self {
        Self {
            current_page: None,
            previous_page: None,
            previous_url: String::new(),
            is_loading_page: false,
            root_selector: root_selector.into(),
        }
    }

    pub fn current_page(&self) -> Option<&PageRef> {
        self.current_page.as_ref()
    }

    pub fn previous_page(&self) -> Option<&PageRef> {
        self.previous_page.as_ref()
    }

    pub fn previous_url(&self) -> &str {
        &self.previous_url
    }

    pub fn is_loading_page(&self) -> bool {
        self.is_loading_page
    }

    pub fn root_selector(&self) -> &str {
        &self.root_selector
    }

    /// Raise the busy flag
    pub fn begin_loading(&mut self) {
        debug!("MediatorState::begin_loading: called");
        self.is_loading_page = true;
    }

    /// Lower the busy flag without changing pages
    pub fn finish_loading(&mut self) {
        debug!("MediatorState::finish_loading: called");
        self.is_loading_page = false;
    }

    /// The leaving page becomes the previous page; no page is current until enter
    pub fn commit_leave(&mut self, leaving: Option<PageRef>, url: impl Into<String>) {
        let url = url.into();
        debug!(%url, "MediatorState::commit_leave: called");
        self.current_page = None;
        self.previous_page = leaving;
        self.previous_url = url;
    }

    /// The next page becomes current and the navigation is over
    pub fn commit_enter(&mut self, next: PageRef) {
        debug!(page = %next.key(), "MediatorState::commit_enter: called");
        self.current_page = Some(next);
        self.is_loading_page = false;
    }

    /// Bootstrap: the page shown at startup is both current and previous
    pub fn adopt_boot_page(&mut self, page: PageRef) {
        debug!(page = %page.key(), "MediatorState::adopt_boot_page: called");
        self.previous_page = Some(page.clone());
        self.current_page = Some(page);
    }

    pub fn set_root(&mut self, root: impl Into<String>) {
        self.root_selector = root.into();
        debug!(root = %self.root_selector, "MediatorState::set_root: called");
    }

    pub fn snapshot(&self, phase: Phase) -> MediatorSnapshot {
        MediatorSnapshot {
            current_page: self.current_page.clone(),
            previous_page: self.previous_page.clone(),
            previous_url: self.previous_url.clone(),
            is_loading_page: self.is_loading_page,
            root_selector: self.root_selector.clone(),
            phase,
        }
    }
}

/// Point-in-time copy of the mediator state
#[derive(Debug, Clone)]
pub struct MediatorSnapshot {
    pub current_page: Option<PageRef>,
    pub previous_page: Option<PageRef>,
    pub previous_url: String,
    pub is_loading_page: bool,
    pub root_selector: String,
    pub phase: Phase,
}

impl MediatorSnapshot {
    pub fn current_key(&self) -> Option<&str> {
        self.current_page.as_ref().map(|p| p.key())
    }

    pub fn previous_key(&self) -> Option<&str> {
        self.previous_page.as_ref().map(|p| p.key())
    }

    /// JSON view with pages reduced to their keys
    pub fn summary(&self) -> Value {
        json!({
            "currentPage": self.current_key(),
            "previousPage": self.previous_key(),
            "previousUrl": self.previous_url,
            "isLoadingPage": self.is_loading_page,
            "root": self.root_selector,
            "phase": self.phase,
        })
    }
}
