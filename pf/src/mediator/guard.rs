//! Navigation guards
//!
//! Predicates that must hold before a navigation starts, composed as
//! `mediator_is_free && can_leave && is_valid_next_page && can_enter`.

use tracing::{error, info};

use super::state::MediatorState;
use crate::page::PageRef;

/// False while a navigation is in flight
pub fn mediator_is_free(state: &MediatorState) -> bool {
    if state.is_loading_page() {
        error!("Mediator is busy waiting for a page load");
        return false;
    }
    true
}

pub fn is_valid_next_page(candidate: Option<&PageRef>) -> bool {
    candidate.is_some()
}

pub fn can_enter(next: &PageRef) -> bool {
    if !next.can_enter() {
        info!(page = %next.key(), "Cannot enter page");
        return false;
    }
    true
}

/// False without a current page, or when the current page refuses
pub fn can_leave(current: Option<&PageRef>) -> bool {
    match current {
        None => {
            error!("No current page set");
            false
        }
        Some(page) if !page.can_leave() => {
            info!(page = %page.key(), "Cannot leave page");
            false
        }
        Some(_) => true,
    }
}
