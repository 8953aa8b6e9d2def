//! MediatorHandle - Client interface to the running Mediator

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use super::messages::{MediatorRequest, NavigationOutcome, Reply, Target};
use super::state::MediatorSnapshot;
use crate::events::Payload;
use crate::page::PageRef;

/// Handle for talking to the Mediator
///
/// Cloneable; every clone talks to the same Mediator task. Navigation requests
/// return as soon as the Mediator has decided whether the navigation starts;
/// use [`MediatorHandle::idle`] to wait for it to finish.
#[derive(Clone)]
pub struct MediatorHandle {
    tx: mpsc::UnboundedSender<MediatorRequest>,
    busy: watch::Receiver<bool>,
}

impl MediatorHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<MediatorRequest>, busy: watch::Receiver<bool>) -> Self {
        debug!("MediatorHandle::new: called");
        Self { tx, busy }
    }

    fn send(&self, request: MediatorRequest) -> Result<()> {
        self.tx.send(request).map_err(|_| eyre!("Mediator channel closed"))
    }

    async fn navigate(&self, target: Target, popped_url: Option<String>) -> Result<NavigationOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(MediatorRequest::Goto {
            target,
            popped_url,
            reply,
        })?;
        rx.await.map_err(|_| eyre!("Mediator dropped the navigation request"))
    }

    /// Navigate to a route
    pub async fn goto(&self, route: &str) -> Result<NavigationOutcome> {
        debug!(%route, "MediatorHandle::goto: called");
        self.navigate(Target::Route(route.to_string()), None).await
    }

    /// Navigate to a route restored from history; `popped_url` becomes the previous URL
    pub async fn goto_popped(&self, route: &str, popped_url: &str) -> Result<NavigationOutcome> {
        debug!(%route, %popped_url, "MediatorHandle::goto_popped: called");
        self.navigate(Target::Route(route.to_string()), Some(popped_url.to_string()))
            .await
    }

    /// Navigate to a page instance
    pub async fn goto_page(&self, page: PageRef) -> Result<NavigationOutcome> {
        debug!(page = %page.key(), "MediatorHandle::goto_page: called");
        self.navigate(Target::Page(page), None).await
    }

    /// Enter the page for `route`, or go back if it is already current
    pub async fn toggle(&self, route: &str, fallback: Option<&str>) -> Result<NavigationOutcome> {
        debug!(%route, ?fallback, "MediatorHandle::toggle: called");
        let (reply, rx) = oneshot::channel();
        self.send(MediatorRequest::Toggle {
            route: route.to_string(),
            fallback: fallback.map(str::to_string),
            reply,
        })?;
        rx.await.map_err(|_| eyre!("Mediator dropped the toggle request"))
    }

    /// Dispatch to the current page, then to every module; returns the defined results
    pub async fn notify(&self, key: &str, payload: Payload) -> Result<Vec<Reply>> {
        debug!(%key, "MediatorHandle::notify: called");
        let (reply, rx) = oneshot::channel();
        self.send(MediatorRequest::Notify {
            key: key.to_string(),
            payload,
            reply,
        })?;
        rx.await.map_err(|_| eyre!("Mediator dropped the notification"))
    }

    /// Dispatch to the current page only
    pub async fn notify_current_page(&self, key: &str, payload: Payload) -> Result<Vec<Reply>> {
        debug!(%key, "MediatorHandle::notify_current_page: called");
        let (reply, rx) = oneshot::channel();
        self.send(MediatorRequest::NotifyCurrentPage {
            key: key.to_string(),
            payload,
            reply,
        })?;
        rx.await.map_err(|_| eyre!("Mediator dropped the notification"))
    }

    pub async fn snapshot(&self) -> Result<MediatorSnapshot> {
        debug!("MediatorHandle::snapshot: called");
        let (reply, rx) = oneshot::channel();
        self.send(MediatorRequest::GetSnapshot { reply })?;
        rx.await.map_err(|_| eyre!("Mediator dropped the snapshot request"))
    }

    /// The page currently entered; `None` while a transition is between leave and enter
    pub async fn current_page(&self) -> Result<Option<PageRef>> {
        debug!("MediatorHandle::current_page: called");
        Ok(self.snapshot().await?.current_page)
    }

    /// Bootstrap the application; `root` overrides the root selector if it exists in the host
    pub async fn run(&self, root: Option<&str>) -> Result<()> {
        debug!(?root, "MediatorHandle::run: called");
        let (reply, rx) = oneshot::channel();
        self.send(MediatorRequest::Run {
            root: root.map(str::to_string),
            reply,
        })?;
        rx.await.map_err(|_| eyre!("Mediator dropped the run request"))
    }

    /// Whether a navigation is in flight
    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Wait until no navigation is in flight
    ///
    /// Never resolves while a page holds on to a completion; bound it with a
    /// timeout when pages are not trusted.
    pub async fn idle(&self) -> Result<()> {
        debug!("MediatorHandle::idle: called");
        let mut busy = self.busy.clone();
        busy.wait_for(|busy| !*busy)
            .await
            .map_err(|_| eyre!("Mediator channel closed"))?;
        Ok(())
    }

    /// Request shutdown of the Mediator
    pub async fn shutdown(&self) -> Result<()> {
        debug!("MediatorHandle::shutdown: called");
        self.send(MediatorRequest::Shutdown)
    }
}
