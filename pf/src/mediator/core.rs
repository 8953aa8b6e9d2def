//! Main Mediator task implementation

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::config::MediatorConfig;
use super::guard;
use super::handle::MediatorHandle;
use super::messages::{MediatorRequest, NavigationOutcome, Reply, Target};
use super::state::{MediatorSnapshot, MediatorState, Phase};
use super::transition::{Completion, Step, TransitionContext};
use crate::dispatch::call_action;
use crate::document::FetchedDocument;
use crate::events::{
    LoadFailedEvent, LoadedEvent, NotFoundEvent, PageEvent, Payload, ProgressEvent, RedirectEvent, RouteNotFoundEvent,
    TransitionEvent, keys,
};
use crate::host::Host;
use crate::loader::{LoadEvent, LoadOutcome, LoadReporter, LoadRequest, LoadResponse, Loader};
use crate::modules::ModuleRegistry;
use crate::page::{InitOptions, PageRef, PageRegistry, same_page, same_slot};

/// Navigation id reserved for the bootstrap enter
const BOOT_NAVIGATION: u64 = 0;

/// The navigation in flight
struct Navigation {
    id: u64,
    /// The URL as requested, used in load and not-found events
    url: String,
    route: Option<String>,
    popped_url: Option<String>,
    next: PageRef,
    leaving: Option<PageRef>,
    phase: Phase,
    handled: bool,
    /// Held until the leave is committed
    pending_enter: Option<Completion>,
    left: bool,
    /// Enter fired before leave; commit it right after the leave
    enter_early: bool,
}

/// The Mediator owns the navigation state and brokers page/module communication
///
/// Every request, loader event and step completion is processed in order by
/// the task started with [`Mediator::run`]; none of the handlers suspend.
pub struct Mediator {
    state: MediatorState,
    pages: PageRegistry,
    modules: ModuleRegistry,
    loader: Arc<dyn Loader>,
    host: Arc<dyn Host>,
    tx: mpsc::UnboundedSender<MediatorRequest>,
    rx: mpsc::UnboundedReceiver<MediatorRequest>,
    busy: watch::Sender<bool>,
    /// Pages whose `init` already ran
    inited: Vec<PageRef>,
    in_flight: Option<Navigation>,
    next_navigation: u64,
}

impl Mediator {
    /// Create a new Mediator with the given configuration and collaborators
    pub fn new(
        config: MediatorConfig,
        pages: PageRegistry,
        modules: ModuleRegistry,
        loader: Arc<dyn Loader>,
        host: Arc<dyn Host>,
    ) -> Self {
        debug!(?config, pages = pages.len(), modules = modules.len(), "Mediator::new: called");
        let (tx, rx) = mpsc::unbounded_channel();
        let (busy, _) = watch::channel(false);
        Self {
            state: MediatorState::new(config.root),
            pages,
            modules,
            loader,
            host,
            tx,
            rx,
            busy,
            inited: Vec::new(),
            in_flight: None,
            next_navigation: BOOT_NAVIGATION + 1,
        }
    }

    /// Get a handle for talking to the running Mediator
    pub fn handle(&self) -> MediatorHandle {
        MediatorHandle::new(self.tx.clone(), self.busy.subscribe())
    }

    /// Run the Mediator task
    ///
    /// This consumes the Mediator and runs until shutdown is requested.
    pub async fn run(mut self) {
        info!("Mediator started");

        while let Some(req) = self.rx.recv().await {
            match req {
                MediatorRequest::Goto {
                    target,
                    popped_url,
                    reply,
                } => {
                    let outcome = self.goto(target, popped_url);
                    let _ = reply.send(outcome);
                }

                MediatorRequest::Toggle { route, fallback, reply } => {
                    let outcome = self.toggle(&route, fallback);
                    let _ = reply.send(outcome);
                }

                MediatorRequest::Notify {
                    key,
                    mut payload,
                    reply,
                } => {
                    let replies = self.notify_all(&key, &mut payload);
                    let _ = reply.send(replies);
                }

                MediatorRequest::NotifyCurrentPage {
                    key,
                    mut payload,
                    reply,
                } => {
                    let replies = self.notify_page(&key, &mut payload);
                    let _ = reply.send(replies);
                }

                MediatorRequest::GetSnapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }

                MediatorRequest::Run { root, reply } => {
                    self.bootstrap(root);
                    let _ = reply.send(());
                }

                MediatorRequest::Load { navigation, event } => {
                    self.on_load_event(navigation, event);
                }

                MediatorRequest::LoadFinished { navigation, outcome } => {
                    self.on_load_finished(navigation, outcome);
                }

                MediatorRequest::Completed { navigation, step } => {
                    self.on_completed(navigation, step);
                }

                MediatorRequest::Shutdown => {
                    info!("Mediator shutting down");
                    break;
                }
            }
        }

        info!("Mediator stopped");
    }

    fn snapshot(&self) -> MediatorSnapshot {
        let phase = self.in_flight.as_ref().map(|n| n.phase).unwrap_or_default();
        self.state.snapshot(phase)
    }

    fn publish_busy(&self) {
        let busy = self.state.is_loading_page();
        debug!(busy, "Mediator::publish_busy: called");
        self.busy.send_replace(busy);
    }

    fn completion(&self, navigation: u64, step: Step) -> Completion {
        Completion::new(self.tx.clone(), navigation, step)
    }

    fn ensure_inited(&mut self, page: &PageRef, opts: InitOptions) {
        if self.inited.iter().any(|p| same_page(p, page)) {
            return;
        }
        debug!(page = %page.key(), first_time = opts.first_time, "Initialising page");
        page.init(opts);
        self.inited.push(page.clone());
    }

    // Broadcasting

    /// Dispatch to the current page; a defined result becomes a reply
    fn notify_page(&self, key: &str, payload: &mut Payload) -> Vec<Reply> {
        let Some(page) = self.state.current_page() else {
            debug!(%key, "notify_page: no current page");
            return Vec::new();
        };
        call_action(page.actions(), key, payload)
            .map(|value| Reply {
                from: page.key().to_string(),
                value,
            })
            .into_iter()
            .collect()
    }

    /// Dispatch to the current page, then to every module in registration order
    fn notify_all(&self, key: &str, payload: &mut Payload) -> Vec<Reply> {
        let mut replies = self.notify_page(key, payload);
        self.modules.notify(key, payload, &mut |from, value| {
            replies.push(Reply {
                from: from.to_string(),
                value,
            })
        });
        replies
    }

    /// Lifecycle event to modules only
    fn broadcast(&self, key: &str, mut payload: Payload) {
        debug!(%key, "broadcast");
        self.modules.notify(key, &mut payload, &mut |from, value| {
            debug!(%key, %from, %value, "Ignoring reply to lifecycle event");
        });
    }

    fn page_event(&self, key: &str, page: Option<PageRef>, route: Option<String>, is_redirect: bool) {
        let mut event = PageEvent::new(page).with_route(route);
        if is_redirect {
            event = event.redirected();
        }
        self.broadcast(key, Payload::Page(event));
    }

    // Navigation

    fn goto(&mut self, target: Target, popped_url: Option<String>) -> NavigationOutcome {
        debug!(?target, ?popped_url, "Mediator::goto: called");

        if !guard::mediator_is_free(&self.state) {
            return NavigationOutcome::Busy;
        }
        if !guard::can_leave(self.state.current_page()) {
            return NavigationOutcome::CannotLeave;
        }

        let (candidate, url, route) = match target {
            Target::Route(route) => (self.pages.page_for_route(&route), route.clone(), Some(route)),
            Target::Page(page) => {
                let url = page.routes().first().cloned().unwrap_or_else(|| page.key().to_string());
                (Some(page), url, None)
            }
        };

        let next = match candidate {
            Some(next) if guard::is_valid_next_page(Some(&next)) => next,
            _ => {
                self.broadcast(
                    keys::PAGES_ROUTE_NOT_FOUND,
                    Payload::RouteNotFound(RouteNotFoundEvent {
                        page: self.state.current_page().cloned(),
                        url: url.clone(),
                        is_redirect: false,
                    }),
                );
                error!(%url, "Route was not found");
                return NavigationOutcome::RouteNotFound;
            }
        };

        if !guard::can_enter(&next) {
            error!(%url, "Route is invalid");
            return NavigationOutcome::CannotEnter;
        }

        if same_slot(Some(&next), self.state.current_page()) {
            self.page_event(keys::PAGES_NAVIGATE_TO_CURRENT, Some(next), route, false);
            info!(%url, "Next page is the current one");
            return NavigationOutcome::NavigateToCurrent;
        }

        let id = self.next_navigation;
        self.next_navigation += 1;
        info!(navigation = id, %url, page = %next.key(), "Navigation started");

        self.state.begin_loading();
        self.publish_busy();

        self.page_event(keys::PAGES_LOADING, Some(next.clone()), None, false);
        self.broadcast(
            keys::PAGES_REQUEST_BEGIN_PAGE_TRANSITION,
            Payload::Transition(TransitionEvent {
                current_page: self.state.current_page().cloned(),
                next_page: Some(next.clone()),
                route: route.clone(),
                is_redirect: false,
            }),
        );

        let cached = next.loaded();
        self.in_flight = Some(Navigation {
            id,
            url: url.clone(),
            route,
            popped_url,
            next: next.clone(),
            leaving: None,
            phase: Phase::Loading,
            handled: false,
            pending_enter: None,
            left: false,
            enter_early: false,
        });

        if cached {
            debug!(page = %next.key(), "Page already loaded");
            self.enter_leave();
            self.broadcast(
                keys::PAGES_LOADED,
                Payload::Loaded(LoadedEvent {
                    url,
                    page: next,
                    node: None,
                    status: None,
                }),
            );
        } else {
            self.start_load(id, url);
        }

        NavigationOutcome::Started
    }

    fn toggle(&mut self, route: &str, fallback: Option<String>) -> NavigationOutcome {
        debug!(%route, ?fallback, "Mediator::toggle: called");

        let Some(current) = self.state.current_page().cloned() else {
            return NavigationOutcome::NoCurrentPage;
        };
        if !guard::mediator_is_free(&self.state) {
            return NavigationOutcome::Busy;
        }

        let next = match self.pages.page_for_route(route) {
            Some(next) if guard::is_valid_next_page(Some(&next)) => next,
            _ => return NavigationOutcome::RouteNotFound,
        };
        if !guard::can_enter(&next) {
            return NavigationOutcome::CannotEnter;
        }

        if !same_page(&next, &current) {
            return self.goto(Target::Route(route.to_string()), None);
        }

        let previous_url = self.state.previous_url().to_string();
        if !previous_url.is_empty() {
            return self.goto(Target::Route(previous_url), None);
        }
        if let Some(fallback) = fallback.filter(|f| !f.is_empty()) {
            return self.goto(Target::Route(fallback), None);
        }

        self.page_event(keys::PAGE_TOGGLE_NO_PREVIOUS_URL, Some(next), None, false);
        NavigationOutcome::NoPreviousUrl
    }

    /// Drop the navigation in flight and free the mediator; pages are untouched
    fn abandon(&mut self) {
        if let Some(nav) = self.in_flight.take() {
            debug!(navigation = nav.id, phase = %nav.phase, "Abandoning navigation");
        }
        self.state.finish_loading();
        self.publish_busy();
    }

    // Loading

    fn start_load(&self, navigation: u64, url: String) {
        debug!(navigation, %url, "Mediator::start_load: called");
        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        let events = self.tx.clone();
        let reporter = LoadReporter::new(move |event| {
            if events.send(MediatorRequest::Load { navigation, event }).is_err() {
                debug!(navigation, "Mediator gone, load event dropped");
            }
        });

        tokio::spawn(async move {
            let outcome = loader.load(LoadRequest::navigation(url), reporter).await;
            if tx.send(MediatorRequest::LoadFinished { navigation, outcome }).is_err() {
                debug!(navigation, "Mediator gone, load outcome dropped");
            }
        });
    }

    fn current_navigation(&self, navigation: u64) -> Option<&Navigation> {
        self.in_flight.as_ref().filter(|n| n.id == navigation)
    }

    fn on_load_event(&mut self, navigation: u64, event: LoadEvent) {
        let Some(url) = self.current_navigation(navigation).map(|n| n.url.clone()) else {
            debug!(navigation, ?event, "Ignoring load event for a navigation no longer in flight");
            return;
        };

        match event {
            LoadEvent::Progress { loaded, total } => {
                let mut payload = Payload::Progress(ProgressEvent::new(url, loaded, total));
                self.notify_all(keys::PAGES_LOAD_PROGRESS, &mut payload);
            }
            LoadEvent::Error { reason } => {
                warn!(%url, %reason, "Page load error");
                self.broadcast(keys::PAGES_LOAD_ERROR, Payload::LoadFailed(LoadFailedEvent { url, reason }));
            }
        }
    }

    fn on_load_finished(&mut self, navigation: u64, outcome: LoadOutcome) {
        let Some(url) = self.current_navigation(navigation).map(|n| n.url.clone()) else {
            warn!(navigation, "Ignoring load outcome for a navigation no longer in flight");
            return;
        };

        match outcome {
            LoadOutcome::Success(response) => self.on_load_success(response),
            LoadOutcome::GaveUp { reason } => {
                error!(%url, %reason, "Loader gave up");
                self.abandon();
                self.broadcast(
                    keys::PAGES_LOAD_FATAL_ERROR,
                    Payload::LoadFailed(LoadFailedEvent { url, reason }),
                );
            }
        }
    }

    fn on_load_success(&mut self, response: LoadResponse) {
        let Some(mut nav) = self.in_flight.take() else {
            return;
        };
        nav.phase = Phase::Resolving;
        debug!(navigation = nav.id, url = %nav.url, status = response.status, "Mediator::on_load_success: called");

        let document = FetchedDocument::parse(&response.body);
        let current = self.state.current_page().cloned();

        let redirect = match document.redirect_target(self.state.root_selector()) {
            Ok(target) => target.filter(|target| *target != nav.url),
            Err(e) => {
                warn!(error = %e, "Cannot look for a redirect marker");
                None
            }
        };

        if let Some(response_url) = redirect {
            info!(requested = %nav.url, response = %response_url, "Response is for another route");
            let corrected = self.pages.page_for_route(&response_url);

            self.broadcast(
                keys::PAGES_REDIRECTED,
                Payload::Redirected(RedirectEvent {
                    current_page: current.clone(),
                    next_page: corrected.clone(),
                    redirected_page: nav.next.clone(),
                    requested_route: nav.route.clone(),
                    response_route: response_url.clone(),
                }),
            );
            self.broadcast(
                keys::PAGES_REQUEST_CANCEL_PAGE_TRANSITION,
                Payload::Transition(TransitionEvent {
                    current_page: current.clone(),
                    next_page: corrected.clone(),
                    route: nav.route.clone(),
                    is_redirect: false,
                }),
            );

            let corrected = match corrected {
                Some(corrected) if guard::is_valid_next_page(Some(&corrected)) => corrected,
                _ => {
                    self.broadcast(
                        keys::PAGES_ROUTE_NOT_FOUND,
                        Payload::RouteNotFound(RouteNotFoundEvent {
                            page: current,
                            url: nav.url.clone(),
                            is_redirect: true,
                        }),
                    );
                    error!(url = %nav.url, %response_url, "Redirected route was not found");
                    self.abandon();
                    return;
                }
            };

            if same_slot(Some(&corrected), current.as_ref()) {
                self.page_event(keys::PAGES_NAVIGATE_TO_CURRENT, Some(corrected), nav.route.clone(), true);
                info!(%response_url, "Redirected next page is the current one");
                self.abandon();
                return;
            }

            self.broadcast(
                keys::PAGES_REQUEST_BEGIN_PAGE_TRANSITION,
                Payload::Transition(TransitionEvent {
                    current_page: current,
                    next_page: Some(corrected.clone()),
                    route: Some(response_url.clone()),
                    is_redirect: true,
                }),
            );
            nav.next = corrected;
            nav.route = Some(response_url);
        }

        let node = match document.select_node(nav.next.key()) {
            Ok(node) => node,
            Err(e) => {
                warn!(error = %e, "Cannot select page node");
                None
            }
        };
        drop(document);

        let Some(node) = node else {
            error!(page = %nav.next.key(), url = %nav.url, "Could not find page node in response");
            self.abandon();
            self.broadcast(
                keys::PAGES_NOT_FOUND,
                Payload::NotFound(NotFoundEvent {
                    data: response.body,
                    url: nav.url,
                    status: response.status,
                    transport: response.transport,
                }),
            );
            return;
        };

        self.host.append(nav.next.key(), &node);
        let loaded = LoadedEvent {
            url: nav.url.clone(),
            page: nav.next.clone(),
            node: Some(node),
            status: Some(response.status),
        };
        self.in_flight = Some(nav);
        self.broadcast(keys::PAGES_LOADED, Payload::Loaded(loaded));
        self.enter_leave();
    }

    // Transition

    fn enter_leave(&mut self) {
        let leaving = self.state.current_page().cloned();
        let Some(nav) = self.in_flight.as_mut() else {
            return;
        };
        nav.phase = Phase::LeaveEnter;
        nav.leaving = leaving.clone();
        let (id, next, route) = (nav.id, nav.next.clone(), nav.route.clone());

        self.ensure_inited(&next, InitOptions::default());

        let mut payload = Payload::Handoff(TransitionContext {
            current_page: leaving.clone(),
            next_page: next.clone(),
            route: route.clone(),
            leave_current: Some(self.completion(id, Step::Leave)),
            enter_next: Some(self.completion(id, Step::Enter)),
            handled: false,
        });
        self.modules
            .notify(keys::PAGES_REQUEST_PAGE_TRANSITION, &mut payload, &mut |_, _| {});

        let (handled, leave_done, enter_done) = match payload {
            Payload::Handoff(ctx) => (ctx.handled, ctx.leave_current, ctx.enter_next),
            _ => {
                warn!("Transition context replaced by a receiver");
                (false, None, None)
            }
        };

        if handled {
            info!(navigation = id, "Transition handled by a module");
            if let Some(nav) = self.in_flight.as_mut() {
                nav.handled = true;
            }
            return;
        }

        let leave_done = leave_done.unwrap_or_else(|| self.completion(id, Step::Leave));
        let enter_done = enter_done.unwrap_or_else(|| self.completion(id, Step::Enter));
        if let Some(nav) = self.in_flight.as_mut() {
            nav.pending_enter = Some(enter_done);
        }

        self.page_event(keys::PAGE_LEAVING, leaving.clone(), None, false);
        match leaving {
            Some(page) => page.leave(leave_done),
            None => leave_done.complete(),
        }
    }

    fn on_completed(&mut self, navigation: u64, step: Step) {
        debug!(navigation, ?step, "Mediator::on_completed: called");

        if let Step::BootEnter { page, route } = step {
            self.page_event(keys::PAGE_ENTER, Some(page), route, false);
            return;
        }

        let Some(nav) = self.in_flight.as_mut().filter(|n| n.id == navigation) else {
            warn!(navigation, ?step, "Ignoring completion for a navigation no longer in flight");
            return;
        };
        if nav.phase != Phase::LeaveEnter {
            warn!(navigation, ?step, phase = %nav.phase, "Ignoring completion before the transition started");
            return;
        }

        match step {
            Step::Leave if nav.left => warn!(navigation, "Leave completed twice, ignoring"),
            Step::Leave => self.commit_leave(),
            Step::Enter if !nav.left => {
                if nav.enter_early {
                    warn!(navigation, "Enter completed twice, ignoring");
                } else {
                    debug!(navigation, "Enter completed before leave, deferring");
                    nav.enter_early = true;
                }
            }
            Step::Enter => self.commit_enter(),
            Step::BootEnter { .. } => {}
        }
    }

    fn commit_leave(&mut self) {
        let Some(nav) = self.in_flight.as_mut() else {
            return;
        };
        nav.left = true;
        let leaving = nav.leaving.take();
        let url = nav.popped_url.clone().unwrap_or_else(|| self.host.current_url());
        let (enter_early, handled) = (nav.enter_early, nav.handled);
        let (next, route) = (nav.next.clone(), nav.route.clone());
        let pending_enter = nav.pending_enter.take();

        self.state.commit_leave(leaving, url);
        self.page_event(keys::PAGE_LEAVE, self.state.previous_page().cloned(), None, false);

        if enter_early {
            self.commit_enter();
            return;
        }
        if handled {
            return;
        }
        if let Some(done) = pending_enter {
            self.page_event(keys::PAGE_ENTERING, Some(next.clone()), route, false);
            next.enter(done);
        }
    }

    fn commit_enter(&mut self) {
        let Some(nav) = self.in_flight.take() else {
            return;
        };
        self.state.commit_enter(nav.next.clone());
        self.page_event(keys::PAGE_ENTER, Some(nav.next.clone()), nav.route, false);
        self.publish_busy();
        info!(navigation = nav.id, page = %nav.next.key(), "Navigation complete");
    }

    // Bootstrap

    fn bootstrap(&mut self, root: Option<String>) {
        debug!(?root, "Mediator::bootstrap: called");

        if let Some(root) = root.filter(|r| self.host.has_node(r)) {
            self.state.set_root(root);
        }

        for module in self.modules.models() {
            module.init();
        }

        let current_url = self.host.current_url();
        let pages: Vec<PageRef> = self.pages.instances().to_vec();
        for page in pages {
            if !page.loaded() {
                continue;
            }
            self.ensure_inited(&page, InitOptions { first_time: true });

            if PageRegistry::match_route(&current_url, page.routes()).is_some() {
                info!(page = %page.key(), url = %current_url, "Entering page shown at startup");
                self.state.adopt_boot_page(page.clone());
                self.page_event(keys::PAGE_ENTERING, Some(page.clone()), Some(current_url.clone()), false);
                let done = self.completion(
                    BOOT_NAVIGATION,
                    Step::BootEnter {
                        page: page.clone(),
                        route: Some(current_url.clone()),
                    },
                );
                page.enter(done);
            }
        }

        let mut payload = Payload::Page(PageEvent::new(self.state.current_page().cloned()));
        self.notify_all(keys::APP_INIT, &mut payload);
        info!(root = %self.state.root_selector(), "Application initialised");
    }
}
