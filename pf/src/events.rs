//! Event vocabulary for mediator broadcasts
//!
//! Every broadcast is a string key plus a [`Payload`]. Lifecycle events raised
//! by the mediator carry one of the typed payload variants; application events
//! sent through `MediatorHandle::notify` usually carry [`Payload::Data`].
//!
//! The same payload value is handed by mutable reference to every receiver of
//! a broadcast in turn, so a receiver may leave information for the next one
//! (the transition hand-off relies on this).

use serde_json::{Value, json};

use crate::loader::Transport;
use crate::mediator::TransitionContext;
use crate::page::PageRef;

/// Broadcast keys raised by the mediator
pub mod keys {
    pub const APP_INIT: &str = "app.init";

    pub const PAGE_ENTER: &str = "page.enter";
    pub const PAGE_LEAVE: &str = "page.leave";
    pub const PAGE_ENTERING: &str = "page.entering";
    pub const PAGE_LEAVING: &str = "page.leaving";
    pub const PAGE_TOGGLE_NO_PREVIOUS_URL: &str = "page.toggleNoPreviousUrl";

    pub const PAGES_LOADING: &str = "pages.loading";
    pub const PAGES_LOADED: &str = "pages.loaded";
    pub const PAGES_NOT_FOUND: &str = "pages.notfound";
    pub const PAGES_LOAD_ERROR: &str = "pages.loaderror";
    pub const PAGES_LOAD_FATAL_ERROR: &str = "pages.loadfatalerror";
    pub const PAGES_LOAD_PROGRESS: &str = "pages.loadprogress";
    pub const PAGES_ROUTE_NOT_FOUND: &str = "pages.routeNotFound";
    pub const PAGES_NAVIGATE_TO_CURRENT: &str = "pages.navigateToCurrent";
    pub const PAGES_REDIRECTED: &str = "pages.redirected";
    pub const PAGES_REQUEST_PAGE_TRANSITION: &str = "pages.requestPageTransition";
    pub const PAGES_REQUEST_BEGIN_PAGE_TRANSITION: &str = "pages.requestBeginPageTransition";
    pub const PAGES_REQUEST_CANCEL_PAGE_TRANSITION: &str = "pages.requestCancelPageTransition";

    /// Every key the mediator can raise
    pub const ALL: &[&str] = &[
        APP_INIT,
        PAGE_ENTER,
        PAGE_LEAVE,
        PAGE_ENTERING,
        PAGE_LEAVING,
        PAGE_TOGGLE_NO_PREVIOUS_URL,
        PAGES_LOADING,
        PAGES_LOADED,
        PAGES_NOT_FOUND,
        PAGES_LOAD_ERROR,
        PAGES_LOAD_FATAL_ERROR,
        PAGES_LOAD_PROGRESS,
        PAGES_ROUTE_NOT_FOUND,
        PAGES_NAVIGATE_TO_CURRENT,
        PAGES_REDIRECTED,
        PAGES_REQUEST_PAGE_TRANSITION,
        PAGES_REQUEST_BEGIN_PAGE_TRANSITION,
        PAGES_REQUEST_CANCEL_PAGE_TRANSITION,
    ];
}

/// Data carried by a broadcast
#[derive(Debug, Default)]
pub enum Payload {
    /// No data
    #[default]
    Empty,
    /// Free-form application data
    Data(Value),
    /// `page.*`, `pages.loading`, `pages.navigateToCurrent`, `app.init`
    Page(PageEvent),
    /// `pages.requestBeginPageTransition`, `pages.requestCancelPageTransition`
    Transition(TransitionEvent),
    /// `pages.redirected`
    Redirected(RedirectEvent),
    /// `pages.routeNotFound`
    RouteNotFound(RouteNotFoundEvent),
    /// `pages.loaded`
    Loaded(LoadedEvent),
    /// `pages.notfound`
    NotFound(NotFoundEvent),
    /// `pages.loaderror`, `pages.loadfatalerror`
    LoadFailed(LoadFailedEvent),
    /// `pages.loadprogress`
    Progress(ProgressEvent),
    /// `pages.requestPageTransition`; a module may take the transition over
    Handoff(TransitionContext),
}

impl Payload {
    /// Mutable access to the transition hand-off context, if this is one
    pub fn handoff_mut(&mut self) -> Option<&mut TransitionContext> {
        match self {
            Payload::Handoff(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// The free-form data, if this is an application payload
    pub fn data(&self) -> Option<&Value> {
        match self {
            Payload::Data(value) => Some(value),
            _ => None,
        }
    }

    /// JSON summary of the payload, with pages reduced to their keys
    pub fn summary(&self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Data(value) => value.clone(),
            Payload::Page(ev) => json!({
                "page": page_key(ev.page.as_ref()),
                "route": ev.route,
                "isRedirect": ev.is_redirect,
            }),
            Payload::Transition(ev) => json!({
                "currentPage": page_key(ev.current_page.as_ref()),
                "nextPage": page_key(ev.next_page.as_ref()),
                "route": ev.route,
                "isRedirect": ev.is_redirect,
            }),
            Payload::Redirected(ev) => json!({
                "currentPage": page_key(ev.current_page.as_ref()),
                "nextPage": page_key(ev.next_page.as_ref()),
                "redirectedPage": ev.redirected_page.key(),
                "requestedRoute": ev.requested_route,
                "responseRoute": ev.response_route,
            }),
            Payload::RouteNotFound(ev) => json!({
                "page": page_key(ev.page.as_ref()),
                "url": ev.url,
                "isRedirect": ev.is_redirect,
            }),
            Payload::Loaded(ev) => json!({
                "url": ev.url,
                "page": ev.page.key(),
                "status": ev.status,
            }),
            Payload::NotFound(ev) => json!({
                "url": ev.url,
                "status": ev.status,
                "transport": ev.transport,
            }),
            Payload::LoadFailed(ev) => json!({
                "url": ev.url,
                "reason": ev.reason,
            }),
            Payload::Progress(ev) => json!({
                "url": ev.url,
                "loaded": ev.loaded,
                "total": ev.total,
                "percent": ev.percent,
            }),
            Payload::Handoff(ctx) => json!({
                "currentPage": page_key(ctx.current_page.as_ref()),
                "nextPage": ctx.next_page.key(),
                "route": ctx.route,
                "isHandled": ctx.handled,
            }),
        }
    }
}

fn page_key(page: Option<&PageRef>) -> Option<String> {
    page.map(|p| p.key().to_string())
}

/// A page-centred lifecycle event
#[derive(Debug, Clone, Default)]
pub struct PageEvent {
    pub page: Option<PageRef>,
    pub route: Option<String>,
    pub is_redirect: bool,
}

impl PageEvent {
    pub fn new(page: Option<PageRef>) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    pub fn with_route(mut self, route: Option<String>) -> Self {
        self.route = route;
        self
    }

    pub fn redirected(mut self) -> Self {
        self.is_redirect = true;
        self
    }
}

/// A transition is about to begin, or is being cancelled
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    pub current_page: Option<PageRef>,
    pub next_page: Option<PageRef>,
    pub route: Option<String>,
    pub is_redirect: bool,
}

/// The server answered for a different route than the one requested
#[derive(Debug, Clone)]
pub struct RedirectEvent {
    pub current_page: Option<PageRef>,
    pub next_page: Option<PageRef>,
    pub redirected_page: PageRef,
    pub requested_route: Option<String>,
    pub response_route: String,
}

#[derive(Debug, Clone)]
pub struct RouteNotFoundEvent {
    pub page: Option<PageRef>,
    pub url: String,
    pub is_redirect: bool,
}

/// The page node is in place; `node` and `status` are absent for cache hits
#[derive(Debug, Clone)]
pub struct LoadedEvent {
    pub url: String,
    pub page: PageRef,
    pub node: Option<String>,
    pub status: Option<u16>,
}

/// The response did not contain the expected page node
#[derive(Debug, Clone)]
pub struct NotFoundEvent {
    pub data: String,
    pub url: String,
    pub status: u16,
    pub transport: Transport,
}

#[derive(Debug, Clone)]
pub struct LoadFailedEvent {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub url: String,
    pub loaded: u64,
    pub total: u64,
    pub percent: f64,
}

impl ProgressEvent {
    /// Build a progress event; `percent` is a fraction in `0.0..=1.0`, zero when the total is unknown
    pub fn new(url: impl Into<String>, loaded: u64, total: u64) -> Self {
        let percent = if total > 0 { loaded as f64 / total as f64 } else { 0.0 };
        Self {
            url: url.into(),
            loaded,
            total,
            percent,
        }
    }
}
