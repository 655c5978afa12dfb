//! Runtime for driving a debate
//!
//! One task owns the debate state. Page actions arrive as commands, timer
//! ticks and call results arrive as events; both go through `transition`.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::DebateRuntime;
pub use traits::*;

use crate::completion::CompletionService;
use crate::debate::{DebateContext, DebateState, Event, TransitionError};
use crate::display::Controls;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = DebateRuntime<Arc<dyn CompletionService>, Arc<BroadcastDisplay>>;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    /// Full page snapshot, sent first on every new stream
    Init {
        markup: String,
        controls: Controls,
        loading: bool,
        state: serde_json::Value,
    },
    ReplaceAll {
        markup: String,
    },
    Append {
        markup: String,
    },
    Clear,
    Scroll,
    Loading {
        visible: bool,
    },
    Controls(Controls),
    StateChange {
        /// Full state as JSON object (e.g. `{"type":"running", ...}`)
        state: serde_json::Value,
    },
    /// The client fell behind and should reconnect
    Error {
        message: String,
    },
}

/// A page action waiting for the runtime's verdict
#[derive(Debug)]
pub struct Command {
    pub event: Event,
    pub reply: oneshot::Sender<Result<(), TransitionError>>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Debate runtime is not running")]
    Stopped,
}

/// Send an event and wait until the runtime has applied or rejected it
pub async fn dispatch(
    command_tx: &mpsc::Sender<Command>,
    event: Event,
) -> Result<(), DispatchError> {
    let (reply, verdict) = oneshot::channel();
    command_tx
        .send(Command { event, reply })
        .await
        .map_err(|_| DispatchError::Stopped)?;
    verdict.await.map_err(|_| DispatchError::Stopped)??;
    Ok(())
}

/// Handle to interact with the running debate
#[derive(Clone)]
pub struct DebateHandle {
    command_tx: mpsc::Sender<Command>,
    pub display: Arc<BroadcastDisplay>,
    pub state_rx: watch::Receiver<DebateState>,
}

impl DebateHandle {
    pub async fn dispatch(&self, event: Event) -> Result<(), DispatchError> {
        dispatch(&self.command_tx, event).await
    }

    /// Latest published state
    pub fn state(&self) -> DebateState {
        self.state_rx.borrow().clone()
    }
}

/// Start the production runtime on the current tokio runtime
pub fn spawn(context: DebateContext, service: Arc<dyn CompletionService>) -> DebateHandle {
    let display = Arc::new(BroadcastDisplay::new(256));
    let (event_tx, event_rx) = mpsc::channel(32);
    let (command_tx, command_rx) = mpsc::channel(32);
    let (state_tx, state_rx) = watch::channel(DebateState::Idle);

    let runtime: ProductionRuntime = DebateRuntime::new(
        context,
        service,
        display.clone(),
        command_rx,
        event_rx,
        event_tx,
        state_tx,
    );
    tokio::spawn(runtime.run());

    DebateHandle {
        command_tx,
        display,
        state_rx,
    }
}
