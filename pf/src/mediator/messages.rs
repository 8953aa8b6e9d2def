//! Message types for the Mediator

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;

use super::state::MediatorSnapshot;
use super::transition::Step;
use crate::events::Payload;
use crate::loader::{LoadEvent, LoadOutcome};
use crate::page::PageRef;

/// Where a navigation should go
#[derive(Debug, Clone)]
pub enum Target {
    /// A route, resolved through the page registry
    Route(String),
    /// A page instance, bypassing route resolution
    Page(PageRef),
}

impl From<&str> for Target {
    fn from(route: &str) -> Self {
        Target::Route(route.to_string())
    }
}

impl From<PageRef> for Target {
    fn from(page: PageRef) -> Self {
        Target::Page(page)
    }
}

/// A defined result returned by a page or module action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// Page key or module name
    pub from: String,
    pub value: Value,
}

/// What became of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavigationOutcome {
    /// The navigation is in flight
    Started,
    /// Another navigation is in flight
    Busy,
    /// No current page, or the current page refused to leave
    CannotLeave,
    /// No page answers to the route
    RouteNotFound,
    /// The next page refused to be entered
    CannotEnter,
    /// The target is the current page
    NavigateToCurrent,
    /// Toggle on the current page with nowhere to go back to
    NoPreviousUrl,
    /// Toggle without a current page
    NoCurrentPage,
}

impl NavigationOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

impl fmt::Display for NavigationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Started => "started",
            Self::Busy => "busy",
            Self::CannotLeave => "cannot-leave",
            Self::RouteNotFound => "route-not-found",
            Self::CannotEnter => "cannot-enter",
            Self::NavigateToCurrent => "navigate-to-current",
            Self::NoPreviousUrl => "no-previous-url",
            Self::NoCurrentPage => "no-current-page",
        };
        write!(f, "{}", s)
    }
}

/// Requests to the Mediator task
#[derive(Debug)]
pub enum MediatorRequest {
    /// Navigate to a route or page
    Goto {
        target: Target,
        popped_url: Option<String>,
        reply: oneshot::Sender<NavigationOutcome>,
    },

    /// Enter a page, or go back if it is already current
    Toggle {
        route: String,
        fallback: Option<String>,
        reply: oneshot::Sender<NavigationOutcome>,
    },

    /// Dispatch to the current page, then to all modules
    Notify {
        key: String,
        payload: Payload,
        reply: oneshot::Sender<Vec<Reply>>,
    },

    /// Dispatch to the current page only
    NotifyCurrentPage {
        key: String,
        payload: Payload,
        reply: oneshot::Sender<Vec<Reply>>,
    },

    /// Read the current state
    GetSnapshot { reply: oneshot::Sender<MediatorSnapshot> },

    /// Bootstrap: init modules and loaded pages, enter the page for the current URL
    Run {
        root: Option<String>,
        reply: oneshot::Sender<()>,
    },

    /// Intermediate loader event for a navigation
    Load { navigation: u64, event: LoadEvent },

    /// Final loader outcome for a navigation
    LoadFinished { navigation: u64, outcome: LoadOutcome },

    /// A leave or enter step was completed
    Completed { navigation: u64, step: Step },

    /// Stop the Mediator task
    Shutdown,
}
