//! Modules: cross-cutting observers of mediator broadcasts
//!
//! Modules are registered independently of any page and receive every
//! broadcast through their action map, in registration order.

mod trace;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{ActionMap, call_action};
use crate::events::Payload;

pub use trace::{TraceEntry, TraceModule};

/// A module notified of lifecycle and application events
pub trait Module: Send + Sync {
    /// Unique name; replies from this module are attributed to it
    fn name(&self) -> &str;

    /// Called once at application bootstrap
    fn init(&self) {}

    fn actions(&self) -> Option<&ActionMap>;
}

/// Shared handle to a module
pub type ModuleRef = Arc<dyn Module>;

/// Registered modules, in registration order
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleRef>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module; a module with the same name is replaced in place
    pub fn register(&mut self, module: ModuleRef) {
        debug!(name = %module.name(), "ModuleRegistry::register: called");
        match self.modules.iter_mut().find(|m| m.name() == module.name()) {
            Some(existing) => {
                warn!(name = %module.name(), "Replacing module registered under the same name");
                *existing = module;
            }
            None => self.modules.push(module),
        }
    }

    pub fn models(&self) -> &[ModuleRef] {
        &self.modules
    }

    /// Dispatch `key` to every module in order; each defined result is passed to `reply`
    pub fn notify(&self, key: &str, payload: &mut Payload, reply: &mut dyn FnMut(&str, Value)) {
        for module in &self.modules {
            if let Some(value) = call_action(module.actions(), key, payload) {
                reply(module.name(), value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
