//! StaticLoader - serves documents from memory

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::{LoadOutcome, LoadReporter, LoadRequest, LoadResponse, Loader, LoaderError, Transport};

/// A canned response
#[derive(Debug, Clone)]
pub struct StaticDocument {
    pub status: u16,
    pub body: String,
}

/// Loader answering from a fixed route → document table
///
/// Routes without a document, and documents with an error status, make the
/// loader give up. `with_failures` makes a route fail a number of times before
/// it succeeds, each failure reported as a recoverable error.
#[derive(Default)]
pub struct StaticLoader {
    documents: HashMap<String, StaticDocument>,
    failures: HashMap<String, u32>,
    requests: Mutex<Vec<LoadRequest>>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for `route`
    pub fn with_document(self, route: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_status(route, 200, body)
    }

    pub fn with_status(mut self, route: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.insert(
            route,
            StaticDocument {
                status,
                body: body.into(),
            },
        );
        self
    }

    /// Report `count` recoverable errors for `route` before serving it
    pub fn with_failures(mut self, route: impl Into<String>, count: u32) -> Self {
        self.failures.insert(route.into(), count);
        self
    }

    pub fn insert(&mut self, route: impl Into<String>, document: StaticDocument) {
        self.documents.insert(route.into(), document);
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl Loader for StaticLoader {
    async fn load(&self, request: LoadRequest, reporter: LoadReporter) -> LoadOutcome {
        debug!(url = %request.url, "StaticLoader::load: called");
        let url = request.url.clone();
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(request);

        for attempt in 1..=self.failures.get(&url).copied().unwrap_or(0) {
            reporter.error(format!("simulated failure {} for {}", attempt, url));
        }

        let Some(document) = self.documents.get(&url) else {
            let err = LoaderError::NoDocument { url };
            reporter.error(err.to_string());
            return LoadOutcome::GaveUp { reason: err.to_string() };
        };

        if document.status >= 400 {
            let err = LoaderError::Status {
                status: document.status,
                url,
            };
            reporter.error(err.to_string());
            return LoadOutcome::GaveUp { reason: err.to_string() };
        }

        let total = document.body.len() as u64;
        reporter.progress(total, total);

        LoadOutcome::Success(LoadResponse {
            body: document.body.clone(),
            status: document.status,
            transport: Transport {
                url,
                content_type: Some("text/html".to_string()),
            },
        })
    }
}
