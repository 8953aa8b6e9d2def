//! Resource loader contract
//!
//! The mediator hands a [`LoadRequest`] to a [`Loader`] and awaits exactly one
//! [`LoadOutcome`]. Intermediate progress and recoverable failures are reported
//! through the [`LoadReporter`] while the load is running. How a loader
//! schedules, retries or sheds requests is its own business.

mod error;
mod http;
mod memory;
mod priority;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

pub use error::LoaderError;
pub use http::HttpLoader;
pub use memory::{StaticDocument, StaticLoader};
pub use priority::Priority;

/// A fetch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// The route or URL to fetch
    pub url: String,
    pub priority: Priority,
    /// VIP requests are never discarded under load-shedding
    pub vip: bool,
}

impl LoadRequest {
    /// A navigation fetch: immediate and never shed
    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority: Priority::Now,
            vip: true,
        }
    }
}

/// Transport details of a completed response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transport {
    /// Final URL after any transport-level redirects
    pub url: String,
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadResponse {
    pub body: String,
    pub status: u16,
    pub transport: Transport,
}

/// The single outcome of a load
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Success(LoadResponse),
    /// The loader will not try again
    GaveUp { reason: String },
}

/// Intermediate events of a running load
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Progress { loaded: u64, total: u64 },
    /// A recoverable failure; the loader may still succeed
    Error { reason: String },
}

/// Sink for [`LoadEvent`]s of one request
#[derive(Clone)]
pub struct LoadReporter {
    sink: Arc<dyn Fn(LoadEvent) + Send + Sync>,
}

impl LoadReporter {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(LoadEvent) + Send + Sync + 'static,
    {
        Self { sink: Arc::new(sink) }
    }

    /// A reporter that drops every event
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn progress(&self, loaded: u64, total: u64) {
        (self.sink)(LoadEvent::Progress { loaded, total });
    }

    pub fn error(&self, reason: impl Into<String>) {
        let reason = reason.into();
        debug!(%reason, "LoadReporter::error");
        (self.sink)(LoadEvent::Error { reason });
    }
}

impl fmt::Debug for LoadReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoadReporter")
    }
}

/// Performs fetches for the mediator
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, request: LoadRequest, reporter: LoadReporter) -> LoadOutcome;
}
