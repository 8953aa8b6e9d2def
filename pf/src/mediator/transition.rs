//! Transition hand-off: completions and the context offered to modules

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::messages::MediatorRequest;
use crate::page::PageRef;

/// A suspended lifecycle step
#[derive(Debug, Clone)]
pub enum Step {
    /// The current page finished leaving
    Leave,
    /// The next page finished entering
    Enter,
    /// The page shown at bootstrap finished entering
    BootEnter { page: PageRef, route: Option<String> },
}

/// One-shot signal that finishes a suspended step
///
/// Consumed by [`Completion::complete`]. Dropping a completion without firing
/// it leaves the step, and therefore the mediator, waiting forever.
pub struct Completion {
    tx: mpsc::UnboundedSender<MediatorRequest>,
    navigation: u64,
    step: Step,
}

impl Completion {
    pub(crate) fn new(tx: mpsc::UnboundedSender<MediatorRequest>, navigation: u64, step: Step) -> Self {
        Self { tx, navigation, step }
    }

    /// Id of the navigation this completion belongs to
    pub fn navigation(&self) -> u64 {
        self.navigation
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn complete(self) {
        debug!(navigation = self.navigation, step = ?self.step, "Completion::complete: called");
        let request = MediatorRequest::Completed {
            navigation: self.navigation,
            step: self.step,
        };
        if self.tx.send(request).is_err() {
            warn!(navigation = self.navigation, "Mediator gone, completion dropped");
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("navigation", &self.navigation)
            .field("step", &self.step)
            .finish()
    }
}

/// Offered to modules with `pages.requestPageTransition`
///
/// A module that wants to run the transition itself calls
/// [`TransitionContext::take_over`] and then owns both completions: the
/// mediator commits the leave and the enter when they fire, leave first.
#[derive(Debug)]
pub struct TransitionContext {
    pub current_page: Option<PageRef>,
    pub next_page: PageRef,
    pub route: Option<String>,
    pub leave_current: Option<Completion>,
    pub enter_next: Option<Completion>,
    pub handled: bool,
}

impl TransitionContext {
    /// Claim the transition; `None` if another receiver already claimed it
    pub fn take_over(&mut self) -> Option<(Completion, Completion)> {
        if self.handled {
            return None;
        }
        match (self.leave_current.take(), self.enter_next.take()) {
            (Some(leave), Some(enter)) => {
                self.handled = true;
                Some((leave, enter))
            }
            (leave, enter) => {
                self.leave_current = leave;
                self.enter_next = enter;
                None
            }
        }
    }
}
