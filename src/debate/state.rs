//! Debate session state

use super::log::ConversationLog;
use crate::completion::CompletionErrorKind;
use crate::config::{DebateConfig, Topic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything owned by one debate, from topic choice to reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub topic: Topic,
    pub log: ConversationLog,
    /// Accepted replies so far
    pub exchanges: u32,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn start(
        id: impl Into<String>,
        topic: Topic,
        log: ConversationLog,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            topic,
            log,
            exchanges: 0,
            started_at,
        }
    }
}

/// Where the running debate is within one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Next tick may issue a call
    #[default]
    Ready,
    /// Exchange call in flight
    AwaitingReply,
    /// Paired reply received, second half not shown yet
    Revealing,
}

/// Driver state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateState {
    /// No topic chosen
    #[default]
    Idle,

    /// Timer active, exchanging turns
    Running { session: Session, phase: TurnPhase },

    /// Timer stopped. The summary call is in flight unless the last paired
    /// reply is still being revealed.
    Summarizing {
        session: Session,
        awaiting_reveal: bool,
    },

    /// Summary rendered
    Concluded { session: Session, summary: String },

    /// A call failed; nothing runs until a new topic is chosen
    Errored {
        session: Session,
        message: String,
        error_kind: Option<CompletionErrorKind>,
    },
}

/// Coarse status, as reported to the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Active,
    AwaitingSummary,
    Concluded,
    Errored,
}

impl DebateState {
    pub fn status(&self) -> SessionStatus {
        match self {
            DebateState::Idle => SessionStatus::Idle,
            DebateState::Running { .. } => SessionStatus::Active,
            DebateState::Summarizing { .. } => SessionStatus::AwaitingSummary,
            DebateState::Concluded { .. } => SessionStatus::Concluded,
            DebateState::Errored { .. } => SessionStatus::Errored,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            DebateState::Idle => None,
            DebateState::Running { session, .. }
            | DebateState::Summarizing { session, .. }
            | DebateState::Concluded { session, .. }
            | DebateState::Errored { session, .. } => Some(session),
        }
    }

    /// True while the timer or a call belongs to the session
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DebateState::Running { .. } | DebateState::Summarizing { .. }
        )
    }
}

/// Immutable context for transitions
#[derive(Debug, Clone)]
pub struct DebateContext {
    pub config: Arc<DebateConfig>,
}

impl DebateContext {
    pub fn new(config: DebateConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
