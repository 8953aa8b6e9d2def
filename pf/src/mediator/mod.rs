//! Navigation mediator
//!
//! The Mediator turns navigation into partial-document transitions. It owns
//! the navigation state and runs as a task reached through a cloneable
//! [`MediatorHandle`]:
//! - **Guard:** a navigation starts only when the mediator is free, the
//!   current page may leave and the next page exists and may be entered
//! - **Load:** pages not yet in the host are fetched and their node appended
//!   under the root, following a redirect marker if the response names another
//!   route
//! - **Transition:** leave the current page, then enter the next; a module may
//!   take the transition over
//! - **Broadcast:** every step is announced to the registered modules

mod config;
mod core;
mod guard;
mod handle;
mod messages;
mod state;
mod transition;

pub use config::MediatorConfig;
pub use core::Mediator;
pub use guard::{can_enter, can_leave, is_valid_next_page, mediator_is_free};
pub use handle::MediatorHandle;
pub use messages::{MediatorRequest, NavigationOutcome, Reply, Target};
pub use state::{MediatorSnapshot, MediatorState, Phase};
pub use transition::{Completion, Step, TransitionContext};
