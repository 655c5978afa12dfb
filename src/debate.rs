//! Debate driver state machine
//!
//! Elm-style: `transition` is pure, the runtime executes the effects it
//! returns and feeds results back in as events.

mod content;
mod effect;
pub mod event;
mod log;
pub mod state;
pub(crate) mod transition;


pub use effect::{CallPurpose, Effect};
pub use event::Event;
pub use state::{DebateContext, DebateState, SessionStatus};
pub use transition::{transition, TransitionError};
