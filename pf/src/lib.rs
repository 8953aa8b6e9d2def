//! pageflow - navigation mediator for partial-document page transitions
//!
//! A mediator fetches the markup of the target route, extracts the page node,
//! swaps it under a fixed root element and runs an ordered lifecycle (leave the
//! current page, enter the next one) while broadcasting lifecycle events to
//! independently registered modules and to the pages themselves.
//!
//! # Core Concepts
//!
//! - **Mediator**: an actor task that owns the navigation state; reach it through
//!   a cloneable [`MediatorHandle`]
//! - **Pages**: route-bound view units implementing [`Page`]
//! - **Modules**: cross-cutting observers implementing [`Module`]
//! - **Actions**: named handlers in an [`ActionMap`], reached by dotted keys
//!
//! # Modules
//!
//! - [`dispatch`] - Action maps and key resolution
//! - [`events`] - Event keys and broadcast payloads
//! - [`mediator`] - Navigation state machine, guards and public handle
//! - [`page`] - Page capability trait, route patterns and the page registry
//! - [`modules`] - Module trait, registry and the trace recorder
//! - [`loader`] - Resource loader contract with HTTP and in-memory loaders
//! - [`document`] - Inspection of fetched documents
//! - [`host`] - The live document the mediator swaps pages into
//! - [`site`] - Site definitions for the simulator
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod events;
pub mod host;
pub mod loader;
pub mod mediator;
pub mod modules;
pub mod page;
pub mod site;

// Re-export commonly used types
pub use config::{Config, LoaderConfig};
pub use dispatch::{Action, ActionMap, Handler, call_action, resolve};
pub use document::{DocumentError, FetchedDocument};
pub use events::{Payload, keys};
pub use host::{Host, MemoryHost};
pub use loader::{
    HttpLoader, LoadEvent, LoadOutcome, LoadReporter, LoadRequest, LoadResponse, Loader, LoaderError, Priority,
    StaticLoader, Transport,
};
pub use mediator::{
    Completion, Mediator, MediatorConfig, MediatorHandle, MediatorRequest, MediatorSnapshot, MediatorState,
    NavigationOutcome, Phase, Reply, Target, TransitionContext,
};
pub use modules::{Module, ModuleRef, ModuleRegistry, TraceEntry, TraceModule};
pub use page::{InitOptions, Page, PageRef, PageRegistry, RouteError, RoutePattern, same_page};
pub use site::{Site, SitePage, SiteParts};
