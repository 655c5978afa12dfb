//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same
//! result. Timers, calls and rendering happen in the runtime, driven by the
//! returned effects.

use super::content::{display_text, paired_turns, ReplyTurns};
use super::log::ConversationLog;
use super::state::{DebateContext, DebateState, Session, TurnPhase};
use super::{Effect, Event};
use crate::completion::{ChatMessage, CompletionError, CompletionRequest, ResponseFormat};
use crate::config::{DebateConfig, Topic, TurnStructure};
use crate::display::{Controls, DisplayEntry, Speaker};
use serde_json::{Map, Value};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DebateState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DebateState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// No state change, nothing to do
    fn ignored(state: &DebateState) -> Self {
        Self::new(state.clone())
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A debate is already in progress (reset it first)")]
    DebateInProgress,
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &DebateState,
    context: &DebateContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let config = context.config.as_ref();

    // Events from a session that is no longer current are dropped
    if !matches!(event, Event::ChooseTopic { .. }) {
        if let Some(event_session) = event.session_id() {
            let current = state.session().map(|s| s.id.as_str());
            if current != Some(event_session) {
                return Ok(TransitionResult::ignored(state));
            }
        }
    }

    match (state, event) {
        // ============================================================
        // Session lifecycle
        // ============================================================
        (current, Event::ChooseTopic { .. }) if current.is_active() => {
            Err(TransitionError::DebateInProgress)
        }

        (
            _,
            Event::ChooseTopic {
                topic_id,
                session_id,
                requested_at,
            },
        ) => {
            let topic = config
                .topic(&topic_id)
                .ok_or(TransitionError::UnknownTopic(topic_id))?;
            let log = ConversationLog::seeded(
                config.instruction_for(topic),
                opening_message(config, topic),
            );
            let session = Session::start(session_id, topic.clone(), log, requested_at);
            let entries = render_log(&session.log, config);
            let timer = Effect::StartTimer {
                session_id: session.id.clone(),
                interval: config.tick_interval,
            };

            Ok(TransitionResult::new(DebateState::Running {
                session,
                phase: TurnPhase::Ready,
            })
            .with_effects([
                Effect::ClearDisplay,
                Effect::SetControls(Controls::debating()),
                Effect::ReplaceAll { entries },
                Effect::ScrollToLatest,
                timer,
            ]))
        }

        (_, Event::Reset) => Ok(TransitionResult::new(DebateState::Idle).with_effects([
            Effect::StopTimer,
            Effect::AbortCompletion,
            Effect::CancelReveal,
            Effect::SetLoading(false),
            Effect::ClearDisplay,
            Effect::notice(&config.notices.choose_topic),
            Effect::SetControls(Controls::topic_selection()),
        ])),

        // ============================================================
        // Exchanges
        // ============================================================
        (
            DebateState::Running {
                session,
                phase: TurnPhase::Ready,
            },
            Event::Tick { .. },
        ) => {
            let request = exchange_request(session, config);
            Ok(TransitionResult::new(DebateState::Running {
                session: session.clone(),
                phase: TurnPhase::AwaitingReply,
            })
            .with_effect(Effect::SetLoading(true))
            .with_effect(Effect::request_exchange(&session.id, request)))
        }

        // A call or reveal is still outstanding; calls never overlap
        (_, Event::Tick { .. }) => Ok(TransitionResult::ignored(state)),

        (
            DebateState::Running {
                session,
                phase: TurnPhase::AwaitingReply,
            },
            Event::ReplyReceived { message, .. },
        ) => Ok(handle_reply(session.clone(), message, config)),

        (
            DebateState::Running {
                session,
                phase: TurnPhase::AwaitingReply,
            },
            Event::ReplyFailed { error, .. },
        ) => Ok(handle_exchange_failure(session.clone(), error)),

        (
            DebateState::Running {
                session,
                phase: TurnPhase::Revealing,
            },
            Event::RevealDue { entry, .. },
        ) => Ok(TransitionResult::new(DebateState::Running {
            session: session.clone(),
            phase: TurnPhase::Ready,
        })
        .with_effects([Effect::append(entry), Effect::ScrollToLatest])),

        // ============================================================
        // Summary
        // ============================================================
        (
            DebateState::Summarizing {
                session,
                awaiting_reveal: true,
            },
            Event::RevealDue { entry, .. },
        ) => Ok(begin_summary(session.clone(), config)
            .with_effects_first([Effect::append(entry), Effect::ScrollToLatest])),

        (
            DebateState::Summarizing {
                session,
                awaiting_reveal: false,
            },
            Event::SummaryReceived { message, .. },
        ) => {
            if message.content.trim().is_empty() {
                let notice = config.notices.missing_summary.clone();
                return Ok(TransitionResult::new(DebateState::Errored {
                    session: session.clone(),
                    message: notice.clone(),
                    error_kind: None,
                })
                .with_effects([
                    Effect::SetLoading(false),
                    Effect::error_entry(notice),
                    Effect::ScrollToLatest,
                    Effect::SetControls(Controls::concluded()),
                ]));
            }

            Ok(TransitionResult::new(DebateState::Concluded {
                session: session.clone(),
                summary: message.content.clone(),
            })
            .with_effects([
                Effect::SetLoading(false),
                Effect::append(DisplayEntry::moderator(message.content)),
                Effect::ScrollToLatest,
                Effect::SetControls(Controls::concluded()),
            ]))
        }

        (
            DebateState::Summarizing {
                session,
                awaiting_reveal: false,
            },
            Event::SummaryFailed { error, .. },
        ) => Ok(TransitionResult::new(DebateState::Errored {
            session: session.clone(),
            message: error.message.clone(),
            error_kind: Some(error.kind),
        })
        .with_effects([
            Effect::SetLoading(false),
            Effect::error_entry(format!("Moderator error: {}", error.message)),
            Effect::ScrollToLatest,
            Effect::SetControls(Controls::concluded()),
        ])),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} in {:?}",
            event.name(),
            state.status()
        ))),
    }
}

impl TransitionResult {
    #[must_use]
    fn with_effects_first(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        let rest = std::mem::take(&mut self.effects);
        self.effects.extend(effects);
        self.effects.extend(rest);
        self
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn handle_reply(mut session: Session, reply: ChatMessage, config: &DebateConfig) -> TransitionResult {
    // Replies always enter the log as the assistant side
    let content = reply.content;
    session.log.push(ChatMessage::assistant(content.clone()));
    session.exchanges += 1;
    session.log.truncate(config.history_window);
    let finished = session.exchanges >= config.exchange_threshold;

    match &config.turn_structure {
        TurnStructure::Alternating { .. } => {
            let rendered = [
                Effect::SetLoading(false),
                Effect::ReplaceAll {
                    entries: render_log(&session.log, config),
                },
                Effect::ScrollToLatest,
            ];

            if finished {
                return begin_summary(session, config)
                    .with_effects_first(rendered.into_iter().chain([Effect::StopTimer]));
            }

            session.log.swap_roles();
            TransitionResult::new(DebateState::Running {
                session,
                phase: TurnPhase::Ready,
            })
            .with_effects(rendered)
        }

        TurnStructure::Paired {
            first_field,
            second_field,
            reveal_delay,
        } => match paired_turns(&content, first_field, second_field) {
            ReplyTurns::Pair { first, second } => {
                let mut result = TransitionResult::new(if finished {
                    DebateState::Summarizing {
                        session: session.clone(),
                        awaiting_reveal: true,
                    }
                } else {
                    DebateState::Running {
                        session: session.clone(),
                        phase: TurnPhase::Revealing,
                    }
                });
                if finished {
                    result = result.with_effect(Effect::StopTimer);
                }
                result.with_effects([
                    Effect::SetLoading(false),
                    Effect::append(DisplayEntry::new(Speaker::Protagonist, first)),
                    Effect::ScrollToLatest,
                    Effect::ScheduleReveal {
                        session_id: session.id.clone(),
                        delay: *reveal_delay,
                        entry: DisplayEntry::new(Speaker::Antagonist, second),
                    },
                ])
            }
            ReplyTurns::Single(text) => {
                let shown = [
                    Effect::SetLoading(false),
                    Effect::append(DisplayEntry::new(Speaker::Assistant, text)),
                    Effect::ScrollToLatest,
                ];
                if finished {
                    return begin_summary(session, config)
                        .with_effects_first(shown.into_iter().chain([Effect::StopTimer]));
                }
                TransitionResult::new(DebateState::Running {
                    session,
                    phase: TurnPhase::Ready,
                })
                .with_effects(shown)
            }
        },
    }
}

fn handle_exchange_failure(session: Session, error: CompletionError) -> TransitionResult {
    let entry = format!("Error: {}. Auto-refresh paused.", error.message);
    TransitionResult::new(DebateState::Errored {
        session,
        message: error.message,
        error_kind: Some(error.kind),
    })
    .with_effects([
        Effect::StopTimer,
        Effect::SetLoading(false),
        Effect::error_entry(entry),
        Effect::ScrollToLatest,
        Effect::SetControls(Controls::errored()),
    ])
}

/// Enter `Summarizing` with the summary call in flight
fn begin_summary(session: Session, config: &DebateConfig) -> TransitionResult {
    let request = summary_request(&session, config);
    let effect = Effect::request_summary(&session.id, request);
    TransitionResult::new(DebateState::Summarizing {
        session,
        awaiting_reveal: false,
    })
    .with_effects([
        Effect::notice(&config.notices.concluding),
        Effect::notice(&config.notices.moderator_thinking),
        Effect::ScrollToLatest,
        Effect::SetLoading(true),
        effect,
    ])
}

fn opening_message(config: &DebateConfig, topic: &Topic) -> ChatMessage {
    match &config.turn_structure {
        TurnStructure::Alternating { reply_field } if config.debate_params.json_output => {
            let mut envelope = Map::new();
            envelope.insert(
                reply_field.clone(),
                Value::String(topic.opening_prompt.clone()),
            );
            ChatMessage::user(Value::Object(envelope).to_string())
        }
        _ => ChatMessage::user(topic.opening_prompt.clone()),
    }
}

fn exchange_request(session: &Session, config: &DebateConfig) -> CompletionRequest {
    let params = config.debate_params;
    CompletionRequest {
        messages: session.log.to_messages(),
        temperature: params.temperature,
        max_tokens: params.max_tokens,
        response_format: params.json_output.then(ResponseFormat::json_object),
    }
}

fn summary_request(session: &Session, config: &DebateConfig) -> CompletionRequest {
    let transcript = session.log.transcript(
        &session.topic.display_name,
        &config.labels,
        &config.turn_structure,
    );
    let params = config.summary_params;
    CompletionRequest {
        messages: vec![
            ChatMessage::system(config.moderator_instruction_for(&session.topic)),
            ChatMessage::user(transcript),
        ],
        temperature: params.temperature,
        max_tokens: params.max_tokens,
        response_format: params.json_output.then(ResponseFormat::json_object),
    }
}

/// Display entries for the exchange part of a log
pub fn render_log(log: &ConversationLog, config: &DebateConfig) -> Vec<DisplayEntry> {
    let mut entries = Vec::with_capacity(log.turns().len());
    for message in log.turns() {
        let speaker = Speaker::from_role(message.role);
        match &config.turn_structure {
            TurnStructure::Alternating { reply_field } => {
                entries.push(DisplayEntry::new(
                    speaker,
                    display_text(&message.content, reply_field),
                ));
            }
            TurnStructure::Paired {
                first_field,
                second_field,
                ..
            } => match paired_turns(&message.content, first_field, second_field) {
                ReplyTurns::Pair { first, second } => {
                    entries.push(DisplayEntry::new(Speaker::Protagonist, first));
                    entries.push(DisplayEntry::new(Speaker::Antagonist, second));
                }
                ReplyTurns::Single(text) => entries.push(DisplayEntry::new(speaker, text)),
            },
        }
    }
    entries
}
