//! Pages: route-bound view units and their registry
//!
//! A page is an externally supplied capability set. The mediator only holds
//! shared handles ([`PageRef`]) to pages and compares them by identity.

mod registry;
mod route;

use std::fmt;
use std::sync::Arc;

pub use registry::PageRegistry;
pub use route::{RouteError, RoutePattern};

use crate::dispatch::ActionMap;
use crate::mediator::Completion;

/// Options passed to [`Page::init`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// True when the page is initialised at application bootstrap
    pub first_time: bool,
}

/// Capability set of a page
///
/// `enter` and `leave` are suspension points: the page decides when the step
/// is finished by firing the [`Completion`] it receives, possibly much later
/// and from another task. A completion that is never fired leaves the mediator
/// busy.
pub trait Page: Send + Sync {
    /// Identity of the page; also the selector of its node in a document
    fn key(&self) -> &str;

    /// Route patterns this page answers to, in priority order
    fn routes(&self) -> &[String];

    /// Actions reachable through notifications while this page is current
    fn actions(&self) -> Option<&ActionMap> {
        None
    }

    /// Whether the page node is already present in the host document
    fn loaded(&self) -> bool;

    fn can_enter(&self) -> bool {
        true
    }

    fn can_leave(&self) -> bool {
        true
    }

    /// Called once per page instance before it is first entered
    fn init(&self, _opts: InitOptions) {}

    fn enter(&self, done: Completion) {
        done.complete();
    }

    fn leave(&self, done: Completion) {
        done.complete();
    }
}

/// Shared handle to a page
pub type PageRef = Arc<dyn Page>;

impl fmt::Debug for dyn Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page").field("key", &self.key()).finish()
    }
}

/// Page identity: two handles refer to the same page instance
pub fn same_page(a: &PageRef, b: &PageRef) -> bool {
    Arc::ptr_eq(a, b)
}

pub(crate) fn same_slot(a: Option<&PageRef>, b: Option<&PageRef>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_page(a, b),
        (None, None) => true,
        _ => false,
    }
}
