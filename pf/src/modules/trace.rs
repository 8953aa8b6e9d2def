//! TraceModule - records every broadcast it observes

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::Module;
use crate::dispatch::{Action, ActionMap};
use crate::events::keys;

/// One observed broadcast
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub key: String,
    pub data: Value,
}

/// Module that logs and records broadcasts, in the order received
pub struct TraceModule {
    name: String,
    actions: ActionMap,
    entries: Arc<Mutex<Vec<TraceEntry>>>,
}

impl TraceModule {
    /// Trace every lifecycle key
    pub fn new() -> Self {
        Self::with_keys([])
    }

    /// Trace the lifecycle keys plus the given application keys
    pub fn with_keys<'a>(extra: impl IntoIterator<Item = &'a str>) -> Self {
        let entries: Arc<Mutex<Vec<TraceEntry>>> = Arc::default();
        let mut actions = ActionMap::new();

        let traced: Vec<String> = keys::ALL
            .iter()
            .map(|k| k.to_string())
            .chain(extra.into_iter().map(str::to_string))
            .collect();

        for key in traced {
            let sink = Arc::clone(&entries);
            actions.insert(
                key,
                Action::handler(move |key, payload| {
                    let data = payload.summary();
                    info!(%key, %data, "broadcast");
                    sink.lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push(TraceEntry {
                            key: key.to_string(),
                            data,
                        });
                    None
                }),
            );
        }

        Self {
            name: "trace".to_string(),
            actions,
            entries,
        }
    }

    /// Snapshot of the recorded entries
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Recorded keys, in order
    pub fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.key).collect()
    }

    /// How many times `key` was observed
    pub fn count(&self, key: &str) -> usize {
        self.entries().iter().filter(|e| e.key == key).count()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Default for TraceModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for TraceModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn actions(&self) -> Option<&ActionMap> {
        Some(&self.actions)
    }
}
