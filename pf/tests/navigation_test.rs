//! Integration tests for navigation through the mediator
//!
//! Each test runs a real Mediator task over in-memory pages, loader and host,
//! and checks the broadcast sequence recorded by a TraceModule.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use common::{ABOUT_DOC, GatedLoader, Harness, TestPage, home_host};
use pageflow::dispatch::{Action, ActionMap};
use pageflow::{
    Completion, MemoryHost, Module, ModuleRef, NavigationOutcome, Payload, Phase, Reply, StaticLoader, keys,
};

fn about_loader() -> StaticLoader {
    StaticLoader::new().with_document("/about", ABOUT_DOC)
}

fn pages() -> (Arc<TestPage>, Arc<TestPage>) {
    let home = TestPage::new("#home", &["/"]).loaded(true).build();
    let about = TestPage::new("#about", &["/about"]).build();
    (home, about)
}

async fn booted(home: &Arc<TestPage>, about: &Arc<TestPage>, loader: StaticLoader) -> Harness {
    let h = Harness::start(&[home.as_page(), about.as_page()], Arc::new(loader), home_host());
    h.boot().await;
    h.trace.clear();
    h
}

/// Module that takes every transition over and keeps the completions
struct Handoff {
    actions: ActionMap,
}

impl Handoff {
    fn new() -> (Arc<Self>, Arc<Mutex<Vec<(Completion, Completion)>>>) {
        let held: Arc<Mutex<Vec<(Completion, Completion)>>> = Arc::default();
        let sink = Arc::clone(&held);
        let actions = ActionMap::new().with(
            keys::PAGES_REQUEST_PAGE_TRANSITION,
            Action::handler(move |_, payload| {
                if let Some(pair) = payload.handoff_mut().and_then(|ctx| ctx.take_over()) {
                    sink.lock().unwrap().push(pair);
                }
                None
            }),
        );
        (Arc::new(Self { actions }), held)
    }
}

impl Module for Handoff {
    fn name(&self) -> &str {
        "handoff"
    }

    fn actions(&self) -> Option<&ActionMap> {
        Some(&self.actions)
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

#[tokio::test]
async fn test_bootstrap_enters_page_for_current_url() {
    let (home, about) = pages();
    let h = Harness::start(&[home.as_page(), about.as_page()], Arc::new(about_loader()), home_host());
    h.boot().await;

    assert_eq!(
        h.trace.keys(),
        vec![keys::PAGE_ENTERING, keys::APP_INIT, keys::PAGE_ENTER]
    );
    let entries = h.trace.entries();
    let entering = &entries[0];
    assert_eq!(entering.data["page"], "#home");
    assert_eq!(entering.data["route"], "/");

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_key(), Some("#home"));
    assert_eq!(snapshot.previous_key(), Some("#home"));
    assert!(!snapshot.is_loading_page);

    assert_eq!(home.inits().len(), 1);
    assert!(home.inits()[0].first_time);
    assert!(about.inits().is_empty());
}

#[tokio::test]
async fn test_bootstrap_root_override_requires_node() {
    let (home, about) = pages();
    let h = Harness::start(&[home.as_page(), about.as_page()], Arc::new(about_loader()), home_host());

    h.handle.run(Some("#missing")).await.unwrap();
    assert_eq!(h.handle.snapshot().await.unwrap().root_selector, "body");

    h.handle.run(Some("#home")).await.unwrap();
    assert_eq!(h.handle.snapshot().await.unwrap().root_selector, "#home");
}

#[tokio::test]
async fn test_bootstrap_without_matching_page() {
    let (home, about) = pages();
    let host = MemoryHost::new("/elsewhere", common::HOME_MARKUP);
    let h = Harness::start(&[home.as_page(), about.as_page()], Arc::new(about_loader()), host);
    h.boot().await;

    assert_eq!(h.trace.keys(), vec![keys::APP_INIT]);
    assert!(h.trace.entries()[0].data["page"].is_null());
    assert_eq!(home.inits().len(), 1);

    // Without a current page nothing can be left
    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::CannotLeave);
}

// =============================================================================
// Navigation
// =============================================================================

#[tokio::test]
async fn test_uncached_navigation_event_order() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::Started);
    h.settle().await;

    assert_eq!(
        h.trace.keys(),
        vec![
            keys::PAGES_LOADING,
            keys::PAGES_REQUEST_BEGIN_PAGE_TRANSITION,
            keys::PAGES_LOAD_PROGRESS,
            keys::PAGES_LOADED,
            keys::PAGES_REQUEST_PAGE_TRANSITION,
            keys::PAGE_LEAVING,
            keys::PAGE_LEAVE,
            keys::PAGE_ENTERING,
            keys::PAGE_ENTER,
        ]
    );

    let entries = h.trace.entries();
    assert_eq!(entries[3].data["url"], "/about");
    assert_eq!(entries[3].data["status"], 200);
    assert_eq!(entries[6].data["page"], "#home");
    assert_eq!(entries[8].data["page"], "#about");
    assert_eq!(entries[8].data["route"], "/about");

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_key(), Some("#about"));
    assert_eq!(snapshot.previous_key(), Some("#home"));
    assert_eq!(snapshot.previous_url, "/");
    assert_eq!(snapshot.phase, Phase::Idle);

    let appended = h.host.appended();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].0, "#about");
    assert!(appended[0].1.contains("About"));
    assert_eq!(about.inits().len(), 1);
    assert!(!about.inits()[0].first_time);
}

#[tokio::test]
async fn test_cached_navigation_skips_loader() {
    let (home, about) = pages();
    about.set_loaded(true);
    let loader = Arc::new(about_loader());
    let h = Harness::start(&[home.as_page(), about.as_page()], loader.clone(), home_host());
    h.boot().await;
    h.trace.clear();

    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::Started);
    h.settle().await;

    assert_eq!(
        h.trace.keys(),
        vec![
            keys::PAGES_LOADING,
            keys::PAGES_REQUEST_BEGIN_PAGE_TRANSITION,
            keys::PAGES_REQUEST_PAGE_TRANSITION,
            keys::PAGE_LEAVING,
            keys::PAGES_LOADED,
            keys::PAGE_LEAVE,
            keys::PAGE_ENTERING,
            keys::PAGE_ENTER,
        ]
    );
    assert!(loader.requests().is_empty());
    assert!(h.host.appended().is_empty());
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

#[tokio::test]
async fn test_goto_current_page_changes_nothing() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    assert_eq!(h.handle.goto("/").await.unwrap(), NavigationOutcome::NavigateToCurrent);
    h.flush().await;

    assert_eq!(h.trace.keys(), vec![keys::PAGES_NAVIGATE_TO_CURRENT]);
    assert_eq!(h.trace.entries()[0].data["isRedirect"], false);
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_key(), Some("#home"));
    assert_eq!(snapshot.previous_url, "");
    assert!(!h.handle.is_busy());
}

#[tokio::test]
async fn test_unknown_route() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    assert_eq!(h.handle.goto("/nope").await.unwrap(), NavigationOutcome::RouteNotFound);

    let entries = h.trace.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, keys::PAGES_ROUTE_NOT_FOUND);
    assert_eq!(entries[0].data["url"], "/nope");
    assert_eq!(entries[0].data["page"], "#home");
    assert_eq!(entries[0].data["isRedirect"], false);
    assert!(!h.handle.is_busy());
}

#[tokio::test]
async fn test_guards_reject_without_broadcast() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    about.refuse_enter();
    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::CannotEnter);

    home.refuse_leave();
    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::CannotLeave);

    assert!(h.trace.entries().is_empty());
    assert!(!h.handle.is_busy());
    assert_eq!(h.current_key().await.as_deref(), Some("#home"));
}

#[tokio::test]
async fn test_second_navigation_rejected_while_busy() {
    let (home, about) = pages();
    let (loader, gate) = GatedLoader::new(about_loader());
    let h = Harness::start(&[home.as_page(), about.as_page()], Arc::new(loader), home_host());
    h.boot().await;

    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::Started);
    assert!(h.handle.is_busy());
    assert_eq!(h.handle.snapshot().await.unwrap().phase, Phase::Loading);

    assert_eq!(h.handle.goto("/").await.unwrap(), NavigationOutcome::Busy);
    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::Busy);

    gate.notify_one();
    h.settle().await;
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

#[tokio::test]
async fn test_goto_page_instance() {
    let (home, about) = pages();
    let loader = Arc::new(about_loader());
    let h = Harness::start(&[home.as_page(), about.as_page()], loader.clone(), home_host());
    h.boot().await;
    h.trace.clear();

    assert_eq!(
        h.handle.goto_page(about.as_page()).await.unwrap(),
        NavigationOutcome::Started
    );
    h.settle().await;

    assert_eq!(loader.requests(), vec!["/about"]);
    let enter = h.trace.entries().into_iter().last().unwrap();
    assert_eq!(enter.key, keys::PAGE_ENTER);
    assert!(enter.data["route"].is_null());
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

#[tokio::test]
async fn test_popped_url_becomes_previous_url() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    h.handle.goto_popped("/about", "/from-history").await.unwrap();
    h.settle().await;

    assert_eq!(h.handle.snapshot().await.unwrap().previous_url, "/from-history");
}

#[tokio::test]
async fn test_previous_url_is_host_url_at_leave() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;
    h.host.set_url("/?tab=2");

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    assert_eq!(h.handle.snapshot().await.unwrap().previous_url, "/?tab=2");
}

#[tokio::test]
async fn test_init_runs_once_per_page() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    h.handle.goto("/about").await.unwrap();
    h.settle().await;
    about.set_loaded(true);

    h.handle.goto("/").await.unwrap();
    h.settle().await;
    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    assert_eq!(about.inits().len(), 1);
    assert_eq!(home.inits().len(), 1);
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

// =============================================================================
// Redirects and failures
// =============================================================================

#[tokio::test]
async fn test_redirect_to_another_page() {
    let (home, about) = pages();
    let news = TestPage::new("#news", &["/news/:id"]).build();
    let loader = StaticLoader::new().with_document(
        "/about",
        r#"<body><div id="news" data-url="/news/7">Story</div></body>"#,
    );
    let h = Harness::start(
        &[home.as_page(), about.as_page(), news.as_page()],
        Arc::new(loader),
        home_host(),
    );
    h.boot().await;
    h.trace.clear();

    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::Started);
    h.settle().await;

    let keys_seen = h.trace.keys();
    let redirected = keys_seen.iter().position(|k| k == keys::PAGES_REDIRECTED).unwrap();
    assert_eq!(keys_seen[redirected + 1], keys::PAGES_REQUEST_CANCEL_PAGE_TRANSITION);
    assert_eq!(keys_seen[redirected + 2], keys::PAGES_REQUEST_BEGIN_PAGE_TRANSITION);
    assert_eq!(keys_seen[redirected + 3], keys::PAGES_LOADED);

    let entries = h.trace.entries();
    let event = &entries[redirected].data;
    assert_eq!(event["currentPage"], "#home");
    assert_eq!(event["nextPage"], "#news");
    assert_eq!(event["redirectedPage"], "#about");
    assert_eq!(event["requestedRoute"], "/about");
    assert_eq!(event["responseRoute"], "/news/7");

    let begin = &entries[redirected + 2].data;
    assert_eq!(begin["route"], "/news/7");
    assert_eq!(begin["isRedirect"], true);

    let enter = entries.last().unwrap();
    assert_eq!(enter.key, keys::PAGE_ENTER);
    assert_eq!(enter.data["page"], "#news");
    assert_eq!(enter.data["route"], "/news/7");

    assert_eq!(h.host.appended()[0].0, "#news");
    assert_eq!(h.current_key().await.as_deref(), Some("#news"));
    assert!(about.inits().is_empty());
    assert_eq!(news.inits().len(), 1);
}

fn news_redirect_harness(home: &Arc<TestPage>, about: &Arc<TestPage>, news: &Arc<TestPage>) -> Harness {
    let loader = StaticLoader::new().with_document(
        "/about",
        r#"<body><div id="news" data-url="/news/7">Story</div></body>"#,
    );
    Harness::start(
        &[home.as_page(), about.as_page(), news.as_page()],
        Arc::new(loader),
        home_host(),
    )
}

#[tokio::test]
async fn test_redirect_keeps_requested_url_as_previous_url() {
    let (home, about) = pages();
    let news = TestPage::new("#news", &["/news/:id"]).build();
    let h = news_redirect_harness(&home, &about, &news);
    h.boot().await;
    // The host shows the requested URL by the time the current page leaves
    h.host.set_url("/about");

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_key(), Some("#news"));
    assert_eq!(snapshot.previous_key(), Some("#home"));
    assert_eq!(snapshot.previous_url, "/about");
}

#[tokio::test]
async fn test_redirect_with_popped_url() {
    let (home, about) = pages();
    let news = TestPage::new("#news", &["/news/:id"]).build();
    let h = news_redirect_harness(&home, &about, &news);
    h.boot().await;
    h.host.set_url("/about");

    h.handle.goto_popped("/about", "/from-history").await.unwrap();
    h.settle().await;

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_key(), Some("#news"));
    assert_eq!(snapshot.previous_url, "/from-history");
}

#[tokio::test]
async fn test_redirect_to_unknown_route_aborts() {
    let (home, about) = pages();
    let loader = StaticLoader::new().with_document(
        "/about",
        r#"<body><div id="about" data-url="/unknown"></div></body>"#,
    );
    let h = booted(&home, &about, loader).await;

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    let entries = h.trace.entries();
    let not_found = entries.iter().find(|e| e.key == keys::PAGES_ROUTE_NOT_FOUND).unwrap();
    assert_eq!(not_found.data["isRedirect"], true);
    assert_eq!(not_found.data["url"], "/about");
    assert_eq!(h.trace.count(keys::PAGES_LOADED), 0);
    assert_eq!(h.trace.count(keys::PAGE_LEAVE), 0);

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_key(), Some("#home"));
    assert!(!snapshot.is_loading_page);
    assert!(h.host.appended().is_empty());
}

#[tokio::test]
async fn test_redirect_to_current_page_stops() {
    let (home, about) = pages();
    let loader = StaticLoader::new().with_document(
        "/about",
        r#"<body><div id="home" data-url="/"></div></body>"#,
    );
    let h = booted(&home, &about, loader).await;

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    let entries = h.trace.entries();
    let current = entries
        .iter()
        .find(|e| e.key == keys::PAGES_NAVIGATE_TO_CURRENT)
        .unwrap();
    assert_eq!(current.data["isRedirect"], true);
    assert_eq!(h.trace.count(keys::PAGE_LEAVE), 0);
    assert_eq!(h.trace.count(keys::PAGES_LOADED), 0);
    assert_eq!(h.current_key().await.as_deref(), Some("#home"));
    assert!(!h.handle.is_busy());
}

#[tokio::test]
async fn test_marker_naming_requested_route_is_not_a_redirect() {
    let (home, about) = pages();
    let loader = StaticLoader::new().with_document(
        "/about",
        r#"<body><div id="about" data-url="/about"></div></body>"#,
    );
    let h = booted(&home, &about, loader).await;

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    assert_eq!(h.trace.count(keys::PAGES_REDIRECTED), 0);
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

#[tokio::test]
async fn test_missing_node_reports_not_found() {
    let (home, about) = pages();
    let loader = StaticLoader::new().with_document("/about", r#"<body><div id="other"></div></body>"#);
    let h = booted(&home, &about, loader).await;

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    let entries = h.trace.entries();
    let not_found = entries.iter().find(|e| e.key == keys::PAGES_NOT_FOUND).unwrap();
    assert_eq!(not_found.data["url"], "/about");
    assert_eq!(not_found.data["status"], 200);
    assert_eq!(h.trace.count(keys::PAGES_LOADED), 0);
    assert_eq!(h.current_key().await.as_deref(), Some("#home"));
    assert!(h.host.appended().is_empty());
}

#[tokio::test]
async fn test_loader_giveup_frees_mediator() {
    let (home, about) = pages();
    let h = booted(&home, &about, StaticLoader::new()).await;

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    assert_eq!(
        h.trace.keys(),
        vec![
            keys::PAGES_LOADING,
            keys::PAGES_REQUEST_BEGIN_PAGE_TRANSITION,
            keys::PAGES_LOAD_ERROR,
            keys::PAGES_LOAD_FATAL_ERROR,
        ]
    );
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_key(), Some("#home"));
    assert_eq!(snapshot.previous_url, "");

    // The mediator accepts the next navigation
    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::Started);
}

#[tokio::test]
async fn test_recoverable_errors_then_success() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader().with_failures("/about", 2)).await;

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    assert_eq!(h.trace.count(keys::PAGES_LOAD_ERROR), 2);
    assert_eq!(h.trace.count(keys::PAGES_LOAD_FATAL_ERROR), 0);
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

// =============================================================================
// Suspended steps and module hand-off
// =============================================================================

#[tokio::test]
async fn test_leave_then_enter_window() {
    let (home, about) = pages();
    about.set_loaded(true);
    let h = booted(&home, &about, about_loader()).await;
    home.hold_leave();
    about.hold_enter();

    h.handle.goto("/about").await.unwrap();
    assert_eq!(home.held_count(), 1);
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current_key(), Some("#home"));
    assert_eq!(snapshot.phase, Phase::LeaveEnter);
    assert_eq!(h.trace.count(keys::PAGE_ENTERING), 0);

    home.release();
    h.flush().await;

    // Left but not entered: no page is current
    let snapshot = h.handle.snapshot().await.unwrap();
    assert!(snapshot.current_page.is_none());
    assert_eq!(snapshot.previous_key(), Some("#home"));
    assert!(snapshot.is_loading_page);
    assert_eq!(about.held_count(), 1);
    assert!(h.handle.notify_current_page("any", Payload::Empty).await.unwrap().is_empty());

    about.release();
    h.settle().await;
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

#[tokio::test]
async fn test_handled_transition_never_completed_stays_busy() {
    let (home, about) = pages();
    let (handoff, _held) = Handoff::new();
    let h = Harness::start_with_modules(
        &[home.as_page(), about.as_page()],
        Arc::new(about_loader()),
        home_host(),
        vec![handoff as ModuleRef],
    );
    h.boot().await;

    assert_eq!(h.handle.goto("/about").await.unwrap(), NavigationOutcome::Started);

    let waited = tokio::time::timeout(Duration::from_millis(200), h.handle.idle()).await;
    assert!(waited.is_err(), "mediator should stay busy");
    assert_eq!(h.handle.goto("/").await.unwrap(), NavigationOutcome::Busy);
    assert_eq!(h.trace.count(keys::PAGE_LEAVING), 0);
    assert_eq!(h.current_key().await.as_deref(), Some("#home"));
}

#[tokio::test]
async fn test_handled_transition_commits_leave_before_enter() {
    let (home, about) = pages();
    let (handoff, held) = Handoff::new();
    let h = Harness::start_with_modules(
        &[home.as_page(), about.as_page()],
        Arc::new(about_loader()),
        home_host(),
        vec![handoff as ModuleRef],
    );
    h.boot().await;
    h.trace.clear();

    h.handle.goto("/about").await.unwrap();
    // Wait for the load to finish and the hand-off to happen
    for _ in 0..50 {
        if !held.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let (leave, enter) = held.lock().unwrap().pop().expect("transition handed off");

    // Fired out of order: enter is deferred until the leave commits
    enter.complete();
    h.flush().await;
    assert_eq!(h.current_key().await.as_deref(), Some("#home"));
    assert!(h.handle.is_busy());

    leave.complete();
    h.settle().await;

    let keys_seen = h.trace.keys();
    let tail: Vec<&str> = keys_seen.iter().rev().take(2).rev().map(String::as_str).collect();
    assert_eq!(tail, vec![keys::PAGE_LEAVE, keys::PAGE_ENTER]);
    assert_eq!(h.trace.count(keys::PAGE_LEAVING), 0);
    assert_eq!(h.trace.count(keys::PAGE_ENTERING), 0);
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

// =============================================================================
// Toggle
// =============================================================================

#[tokio::test]
async fn test_toggle_without_current_page() {
    let (home, about) = pages();
    let h = Harness::start(&[home.as_page(), about.as_page()], Arc::new(about_loader()), home_host());

    assert_eq!(
        h.handle.toggle("/about", None).await.unwrap(),
        NavigationOutcome::NoCurrentPage
    );
}

#[tokio::test]
async fn test_toggle_goes_forward_then_back() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    assert_eq!(h.handle.toggle("/about", None).await.unwrap(), NavigationOutcome::Started);
    h.settle().await;
    h.host.set_url("/about");
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));

    // Toggling the current page goes back to the previous URL
    assert_eq!(h.handle.toggle("/about", None).await.unwrap(), NavigationOutcome::Started);
    h.settle().await;
    assert_eq!(h.current_key().await.as_deref(), Some("#home"));
}

#[tokio::test]
async fn test_toggle_current_page_without_previous_url() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    assert_eq!(
        h.handle.toggle("/", None).await.unwrap(),
        NavigationOutcome::NoPreviousUrl
    );
    assert_eq!(h.trace.keys(), vec![keys::PAGE_TOGGLE_NO_PREVIOUS_URL]);
    assert_eq!(h.trace.entries()[0].data["page"], "#home");

    assert_eq!(
        h.handle.toggle("/", Some("/about")).await.unwrap(),
        NavigationOutcome::Started
    );
    h.settle().await;
    assert_eq!(h.current_key().await.as_deref(), Some("#about"));
}

#[tokio::test]
async fn test_toggle_unknown_route_is_silent() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    assert_eq!(
        h.handle.toggle("/nope", None).await.unwrap(),
        NavigationOutcome::RouteNotFound
    );
    assert!(h.trace.entries().is_empty());
}

// =============================================================================
// Notifications
// =============================================================================

struct Counter {
    actions: ActionMap,
}

impl Module for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn actions(&self) -> Option<&ActionMap> {
        Some(&self.actions)
    }
}

#[tokio::test]
async fn test_notify_replies_page_first_then_modules() {
    let home = TestPage::new("#home", &["/"])
        .loaded(true)
        .with_action("cart.count", Action::handler(|_, _| Some(json!(1))))
        .build();
    let about = TestPage::new("#about", &["/about"]).build();
    let counter = Arc::new(Counter {
        actions: ActionMap::new().with(
            "cart",
            Action::table([("count", Action::handler(|_, _| Some(json!(2))))]),
        ),
    });
    let h = Harness::start_with_modules(
        &[home.as_page(), about.as_page()],
        Arc::new(about_loader()),
        home_host(),
        vec![counter as ModuleRef],
    );
    h.boot().await;

    let replies = h.handle.notify("cart.count", Payload::Empty).await.unwrap();
    assert_eq!(
        replies,
        vec![
            Reply {
                from: "#home".to_string(),
                value: json!(1)
            },
            Reply {
                from: "counter".to_string(),
                value: json!(2)
            },
        ]
    );

    let page_only = h.handle.notify_current_page("cart.count", Payload::Empty).await.unwrap();
    assert_eq!(page_only.len(), 1);
    assert_eq!(page_only[0].from, "#home");

    assert!(h.handle.notify("cart.empty", Payload::Empty).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_load_progress_reaches_current_page() {
    let seen: Arc<Mutex<Vec<f64>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let home = TestPage::new("#home", &["/"])
        .loaded(true)
        .with_action(
            keys::PAGES_LOAD_PROGRESS,
            Action::handler(move |_, payload| {
                if let Payload::Progress(progress) = payload {
                    sink.lock().unwrap().push(progress.percent);
                }
                None
            }),
        )
        .build();
    let about = TestPage::new("#about", &["/about"]).build();
    let h = booted(&home, &about, about_loader()).await;

    h.handle.goto("/about").await.unwrap();
    h.settle().await;

    assert_eq!(*seen.lock().unwrap(), vec![1.0]);
}

#[tokio::test]
async fn test_shutdown_closes_handle() {
    let (home, about) = pages();
    let h = booted(&home, &about, about_loader()).await;

    h.handle.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), h.task)
        .await
        .expect("mediator should stop")
        .unwrap();

    assert!(h.handle.goto("/about").await.is_err());
}
