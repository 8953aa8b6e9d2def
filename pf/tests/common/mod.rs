//! Shared helpers for the pageflow integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use pageflow::dispatch::{Action, ActionMap};
use pageflow::{
    Completion, InitOptions, LoadOutcome, LoadReporter, LoadRequest, Loader, Mediator, MediatorConfig, MediatorHandle,
    MemoryHost, ModuleRef, ModuleRegistry, Page, PageRef, PageRegistry, StaticLoader, TraceModule,
};

pub const HOME_MARKUP: &str = r#"<body><div id="home">Home</div></body>"#;
pub const ABOUT_DOC: &str = r#"<html><body><div id="about">About</div></body></html>"#;

/// A page whose capabilities and suspensions are controlled by the test
pub struct TestPage {
    key: String,
    routes: Vec<String>,
    actions: ActionMap,
    loaded: AtomicBool,
    can_enter: AtomicBool,
    can_leave: AtomicBool,
    hold_leave: AtomicBool,
    hold_enter: AtomicBool,
    held: Mutex<Vec<Completion>>,
    inits: Mutex<Vec<InitOptions>>,
}

impl TestPage {
    pub fn new(key: &str, routes: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            routes: routes.iter().map(|r| r.to_string()).collect(),
            actions: ActionMap::new(),
            loaded: AtomicBool::new(false),
            can_enter: AtomicBool::new(true),
            can_leave: AtomicBool::new(true),
            hold_leave: AtomicBool::new(false),
            hold_enter: AtomicBool::new(false),
            held: Mutex::new(Vec::new()),
            inits: Mutex::new(Vec::new()),
        }
    }

    pub fn loaded(self, loaded: bool) -> Self {
        self.loaded.store(loaded, Ordering::SeqCst);
        self
    }

    pub fn with_action(mut self, key: &str, action: Action) -> Self {
        self.actions.insert(key, action);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::SeqCst);
    }

    pub fn refuse_enter(&self) {
        self.can_enter.store(false, Ordering::SeqCst);
    }

    pub fn refuse_leave(&self) {
        self.can_leave.store(false, Ordering::SeqCst);
    }

    /// Keep the next leave/enter completions instead of firing them
    pub fn hold_leave(&self) {
        self.hold_leave.store(true, Ordering::SeqCst);
    }

    pub fn hold_enter(&self) {
        self.hold_enter.store(true, Ordering::SeqCst);
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap().len()
    }

    /// Fire every held completion, oldest first
    pub fn release(&self) {
        self.hold_leave.store(false, Ordering::SeqCst);
        self.hold_enter.store(false, Ordering::SeqCst);
        let held: Vec<Completion> = self.held.lock().unwrap().drain(..).collect();
        for done in held {
            done.complete();
        }
    }

    pub fn inits(&self) -> Vec<InitOptions> {
        self.inits.lock().unwrap().clone()
    }

    pub fn as_page(self: &Arc<Self>) -> PageRef {
        self.clone()
    }
}

impl Page for TestPage {
    fn key(&self) -> &str {
        &self.key
    }

    fn routes(&self) -> &[String] {
        &self.routes
    }

    fn actions(&self) -> Option<&ActionMap> {
        Some(&self.actions)
    }

    fn loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    fn can_enter(&self) -> bool {
        self.can_enter.load(Ordering::SeqCst)
    }

    fn can_leave(&self) -> bool {
        self.can_leave.load(Ordering::SeqCst)
    }

    fn init(&self, opts: InitOptions) {
        self.inits.lock().unwrap().push(opts);
    }

    fn enter(&self, done: Completion) {
        if self.hold_enter.load(Ordering::SeqCst) {
            self.held.lock().unwrap().push(done);
        } else {
            done.complete();
        }
    }

    fn leave(&self, done: Completion) {
        if self.hold_leave.load(Ordering::SeqCst) {
            self.held.lock().unwrap().push(done);
        } else {
            done.complete();
        }
    }
}

/// Loader that waits for the test to open the gate before each load
pub struct GatedLoader {
    inner: StaticLoader,
    gate: Arc<Notify>,
}

impl GatedLoader {
    pub fn new(inner: StaticLoader) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                inner,
                gate: Arc::clone(&gate),
            },
            gate,
        )
    }
}

#[async_trait]
impl Loader for GatedLoader {
    async fn load(&self, request: LoadRequest, reporter: LoadReporter) -> LoadOutcome {
        self.gate.notified().await;
        self.inner.load(request, reporter).await
    }
}

/// A running mediator plus the collaborators a test inspects
pub struct Harness {
    pub handle: MediatorHandle,
    pub trace: Arc<TraceModule>,
    pub host: Arc<MemoryHost>,
    pub task: JoinHandle<()>,
}

impl Harness {
    pub fn start(pages: &[PageRef], loader: Arc<dyn Loader>, host: MemoryHost) -> Self {
        Self::start_with_modules(pages, loader, host, Vec::new())
    }

    /// Extra modules are registered after the trace module
    pub fn start_with_modules(
        pages: &[PageRef],
        loader: Arc<dyn Loader>,
        host: MemoryHost,
        extra: Vec<ModuleRef>,
    ) -> Self {
        let mut registry = PageRegistry::new();
        for page in pages {
            registry.register(page.clone()).expect("valid routes");
        }

        let trace = Arc::new(TraceModule::new());
        let mut modules = ModuleRegistry::new();
        modules.register(trace.clone());
        for module in extra {
            modules.register(module);
        }

        let host = Arc::new(host);
        let mediator = Mediator::new(MediatorConfig::default(), registry, modules, loader, host.clone());
        let handle = mediator.handle();
        let task = tokio::spawn(mediator.run());

        Self {
            handle,
            trace,
            host,
            task,
        }
    }

    /// Bootstrap and let the startup enter complete
    pub async fn boot(&self) {
        self.handle.run(None).await.expect("run");
        self.handle.snapshot().await.expect("snapshot");
    }

    /// Wait for the navigation in flight to finish
    pub async fn settle(&self) {
        tokio::time::timeout(Duration::from_secs(2), self.handle.idle())
            .await
            .expect("navigation did not settle")
            .expect("mediator alive");
    }

    /// Process everything queued so far
    pub async fn flush(&self) {
        self.handle.snapshot().await.expect("snapshot");
    }

    pub async fn current_key(&self) -> Option<String> {
        self.handle
            .snapshot()
            .await
            .expect("snapshot")
            .current_key()
            .map(str::to_string)
    }
}

pub fn home_host() -> MemoryHost {
    MemoryHost::new("/", HOME_MARKUP)
}
