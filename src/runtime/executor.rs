//! Debate runtime executor

use super::traits::DisplaySurface;
use super::Command;
use crate::completion::CompletionService;
use crate::debate::{
    transition, CallPurpose, DebateContext, DebateState, Effect, Event, TransitionError,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Generic debate runtime that can work with any completion service and display
pub struct DebateRuntime<C, D>
where
    C: CompletionService + 'static,
    D: DisplaySurface + 'static,
{
    context: DebateContext,
    state: DebateState,
    service: Arc<C>,
    display: D,
    command_rx: mpsc::Receiver<Command>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    state_tx: watch::Sender<DebateState>,
    /// Periodic tick task for the running session
    ticker: Option<JoinHandle<()>>,
    /// Token to cancel the in-flight completion call
    call_token: Option<CancellationToken>,
    /// Pending second half of a paired reply
    reveal: Option<JoinHandle<()>>,
}

impl<C, D> DebateRuntime<C, D>
where
    C: CompletionService + 'static,
    D: DisplaySurface + 'static,
{
    pub fn new(
        context: DebateContext,
        service: C,
        display: D,
        command_rx: mpsc::Receiver<Command>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        state_tx: watch::Sender<DebateState>,
    ) -> Self {
        Self {
            context,
            state: DebateState::Idle,
            service: Arc::new(service),
            display,
            command_rx,
            event_rx,
            event_tx,
            state_tx,
            ticker: None,
            call_token: None,
            reveal: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            variant = %self.context.config.variant,
            endpoint = %self.service.endpoint(),
            "Starting debate runtime"
        );

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    let Some(Command { event, reply }) = command else {
                        break;
                    };
                    let _ = reply.send(self.process_event(event));
                }
                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::warn!(error = %e, "Dropped internal event");
                    }
                }
            }
        }

        self.stop_timer();
        self.cancel_call();
        self.cancel_reveal();
        tracing::info!("Debate runtime stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let name = event.name();
        let session_id = event.session_id().map(str::to_string);

        // Pure state transition
        let result = transition(&self.state, &self.context, event).inspect_err(|e| {
            tracing::warn!(event = name, error = %e, "Rejected debate event");
        })?;

        if result.effects.is_empty() && result.new_state == self.state {
            tracing::debug!(event = name, session_id = ?session_id, "Ignored debate event");
            return Ok(());
        }

        // Update state
        let old_state = std::mem::replace(&mut self.state, result.new_state);
        if old_state.status() != self.state.status() {
            tracing::info!(
                event = name,
                session_id = ?self.state.session().map(|s| s.id.as_str()),
                from = ?old_state.status(),
                to = ?self.state.status(),
                exchanges = self.state.session().map_or(0, |s| s.exchanges),
                "Debate state changed"
            );
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }

        self.state_tx.send_replace(self.state.clone());
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::StartTimer {
                session_id,
                interval,
            } => {
                self.stop_timer();
                let event_tx = self.event_tx.clone();
                self.ticker = Some(tokio::spawn(async move {
                    // First tick one interval after start, not immediately
                    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        ticker.tick().await;
                        let tick = Event::Tick {
                            session_id: session_id.clone(),
                        };
                        if event_tx.send(tick).await.is_err() {
                            break;
                        }
                    }
                }));
            }

            Effect::StopTimer => self.stop_timer(),

            Effect::RequestCompletion {
                session_id,
                purpose,
                request,
            } => {
                // Create cancellation token for this call
                self.cancel_call();
                let cancel_token = CancellationToken::new();
                self.call_token = Some(cancel_token.clone());

                let service = self.service.clone();
                let event_tx = self.event_tx.clone();

                tokio::spawn(async move {
                    tracing::debug!(
                        session_id = %session_id,
                        purpose = ?purpose,
                        messages = request.messages.len(),
                        "Making completion request (background)"
                    );

                    // Race the call against cancellation
                    tokio::select! {
                        biased;

                        () = cancel_token.cancelled() => {
                            tracing::info!(session_id = %session_id, "Completion request cancelled");
                        }

                        result = service.complete(&request) => {
                            let event = match (purpose, result) {
                                (CallPurpose::Exchange, Ok(message)) => Event::ReplyReceived { session_id, message },
                                (CallPurpose::Exchange, Err(error)) => Event::ReplyFailed { session_id, error },
                                (CallPurpose::Summary, Ok(message)) => Event::SummaryReceived { session_id, message },
                                (CallPurpose::Summary, Err(error)) => Event::SummaryFailed { session_id, error },
                            };
                            let _ = event_tx.send(event).await;
                        }
                    }
                });
            }

            Effect::AbortCompletion => self.cancel_call(),

            Effect::ScheduleReveal {
                session_id,
                delay,
                entry,
            } => {
                self.cancel_reveal();
                let event_tx = self.event_tx.clone();
                self.reveal = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = event_tx.send(Event::RevealDue { session_id, entry }).await;
                }));
            }

            Effect::CancelReveal => self.cancel_reveal(),

            Effect::ClearDisplay => self.display.clear(),
            Effect::ReplaceAll { entries } => self.display.replace_all(&entries),
            Effect::Append { entry } => self.display.append(&entry),
            Effect::ScrollToLatest => self.display.scroll_to_latest(),
            Effect::SetLoading(visible) => self.display.set_loading(visible),
            Effect::SetControls(controls) => self.display.set_controls(controls),
        }
    }

    fn stop_timer(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn cancel_call(&mut self) {
        if let Some(token) = self.call_token.take() {
            token.cancel();
        }
    }

    fn cancel_reveal(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            reveal.abort();
        }
    }
}
