//! Action dispatch
//!
//! Pages and modules expose an [`ActionMap`] of named handlers. A key is looked
//! up directly first; a dotted key such as `menu.open` then falls back to a walk
//! through nested tables (`{"menu": {"open": handler}}`).
//!
//! A missing action is not an error: dispatching a key nobody handles is the
//! normal case for a broadcast, so resolution failures return `None` quietly.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::events::Payload;

/// An action handler, called with the dispatched key and the payload
pub type Handler = Arc<dyn Fn(&str, &mut Payload) -> Option<Value> + Send + Sync>;

/// One entry of an action map
#[derive(Clone)]
pub enum Action {
    /// A callable handler
    Handler(Handler),
    /// A nested table, reachable through dotted keys
    Table(ActionMap),
    /// A plain value; present in the map but never callable
    Value(Value),
}

impl Action {
    /// Wrap a closure as a handler action
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&str, &mut Payload) -> Option<Value> + Send + Sync + 'static,
    {
        Action::Handler(Arc::new(f))
    }

    /// Build a nested table action
    pub fn table<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Action)>,
    {
        Action::Table(entries.into_iter().collect())
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Handler(_) => f.write_str("Handler(..)"),
            Action::Table(map) => f.debug_tuple("Table").field(map).finish(),
            Action::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// Named actions of a page or module
#[derive(Clone, Debug, Default)]
pub struct ActionMap {
    entries: HashMap<String, Action>,
}

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, action: Action) -> Self {
        self.insert(key, action);
        self
    }

    /// Insert or replace an action
    pub fn insert(&mut self, key: impl Into<String>, action: Action) {
        self.entries.insert(key.into(), action);
    }

    pub fn get(&self, key: &str) -> Option<&Action> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Action)> for ActionMap {
    fn from_iter<I: IntoIterator<Item = (K, Action)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, a)| (k.into(), a)).collect(),
        }
    }
}

/// Resolve `key` to a handler
///
/// A direct entry wins. Otherwise a dotted key walks nested tables; any
/// intermediate that is not a table, or a final entry that is not a handler,
/// means no match.
pub fn resolve<'a>(actions: &'a ActionMap, key: &str) -> Option<&'a Handler> {
    if let Some(Action::Handler(handler)) = actions.get(key) {
        return Some(handler);
    }

    if !key.contains('.') {
        return None;
    }

    let mut table = actions;
    let mut segments = key.split('.').peekable();
    while let Some(segment) = segments.next() {
        let is_last = segments.peek().is_none();
        match (table.get(segment)?, is_last) {
            (Action::Table(next), false) => table = next,
            (Action::Handler(handler), true) => return Some(handler),
            _ => return None,
        }
    }

    None
}

/// Resolve and invoke `key`, returning the handler's result
pub fn call_action(actions: Option<&ActionMap>, key: &str, payload: &mut Payload) -> Option<Value> {
    let Some(actions) = actions else {
        trace!(%key, "call_action: no action map");
        return None;
    };

    match resolve(actions, key) {
        Some(handler) => handler(key, payload),
        None => {
            trace!(%key, "call_action: no handler");
            None
        }
    }
}
