//! HttpLoader - fetches pages over HTTP

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};
use url::Url;

use super::{LoadOutcome, LoadReporter, LoadRequest, LoadResponse, Loader, LoaderError, Priority, Transport};
use crate::config::LoaderConfig;

/// Loader backed by `reqwest`
///
/// Relative routes are joined onto the configured base URL. Each failed
/// attempt is reported as a recoverable error; the loader gives up after
/// `max-attempts` or on the first error that cannot improve by retrying.
/// At most `max-concurrent` [`Priority::Normal`] fetches run at once;
/// [`Priority::Now`] fetches are never held back.
pub struct HttpLoader {
    client: reqwest::Client,
    base_url: Option<Url>,
    max_attempts: u32,
    max_body_bytes: usize,
    slots: Arc<Semaphore>,
}

impl HttpLoader {
    pub fn new(config: &LoaderConfig) -> Result<Self, LoaderError> {
        debug!(?config, "HttpLoader::new: called");
        let base_url = config
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| LoaderError::InvalidUrl {
                    url: raw.to_string(),
                    source: e,
                })
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url,
            max_attempts: config.max_attempts.max(1),
            max_body_bytes: config.max_body_bytes,
            slots: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Wait for a fetch slot; `None` when the priority skips the limit
    async fn admit(&self, priority: Priority) -> Option<OwnedSemaphorePermit> {
        if !priority.waits_for_slot() {
            return None;
        }
        // The semaphore is never closed
        Arc::clone(&self.slots).acquire_owned().await.ok()
    }

    /// Absolute URL for a route
    pub fn resolve_url(&self, route: &str) -> Result<Url, LoaderError> {
        match Url::parse(route) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| LoaderError::MissingBaseUrl {
                    url: route.to_string(),
                })?;
                base.join(route).map_err(|e| LoaderError::InvalidUrl {
                    url: route.to_string(),
                    source: e,
                })
            }
            Err(e) => Err(LoaderError::InvalidUrl {
                url: route.to_string(),
                source: e,
            }),
        }
    }

    async fn attempt(&self, url: &Url, reporter: &LoadReporter) -> Result<LoadResponse, LoaderError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoaderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let total = response.content_length().unwrap_or(0);
        let transport = Transport {
            url: response.url().to_string(),
            content_type: response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        };

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            body.extend_from_slice(&chunk);
            if body.len() > self.max_body_bytes {
                return Err(LoaderError::TooLarge {
                    url: url.to_string(),
                    limit: self.max_body_bytes,
                });
            }
            reporter.progress(body.len() as u64, total);
        }

        Ok(LoadResponse {
            body: String::from_utf8_lossy(&body).into_owned(),
            status: status.as_u16(),
            transport,
        })
    }
}

#[async_trait]
impl Loader for HttpLoader {
    async fn load(&self, request: LoadRequest, reporter: LoadReporter) -> LoadOutcome {
        debug!(url = %request.url, priority = %request.priority, vip = request.vip, "HttpLoader::load: called");

        let url = match self.resolve_url(&request.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot resolve request URL");
                return LoadOutcome::GaveUp { reason: e.to_string() };
            }
        };

        let _slot = self.admit(request.priority).await;

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            match self.attempt(&url, &reporter).await {
                Ok(response) => {
                    info!(%url, status = response.status, attempt, "Fetched page");
                    return LoadOutcome::Success(response);
                }
                Err(e) => {
                    warn!(%url, attempt, error = %e, "Fetch attempt failed");
                    reporter.error(e.to_string());
                    last_error = e.to_string();
                    if !e.is_retryable() {
                        break;
                    }
                }
            }
        }

        LoadOutcome::GaveUp { reason: last_error }
    }
}
