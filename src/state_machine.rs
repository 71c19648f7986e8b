//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::{Effect, Operation, Reply};
pub use event::{Event, Outcome};
pub use state::{ConvContext, ConvState, Conversation};
pub use transition::{transition, TransitionError, PLACEHOLDER_COLLECTION};
