//! Events fed to the debate state machine

use crate::completion::{ChatMessage, CompletionError};
use crate::display::DisplayEntry;
use chrono::{DateTime, Utc};

/// Events that can occur. Everything after `ChooseTopic` names the session it
/// belongs to, so anything left over from an earlier session is dropped.
#[derive(Debug, Clone)]
pub enum Event {
    /// User picked a topic. The id is minted by the caller.
    ChooseTopic {
        topic_id: String,
        session_id: String,
        requested_at: DateTime<Utc>,
    },

    /// User asked for a new topic
    Reset,

    /// Periodic timer fired
    Tick { session_id: String },

    /// Exchange call succeeded
    ReplyReceived {
        session_id: String,
        message: ChatMessage,
    },

    /// Exchange call failed
    ReplyFailed {
        session_id: String,
        error: CompletionError,
    },

    /// Delay before the second half of a paired reply elapsed
    RevealDue {
        session_id: String,
        entry: DisplayEntry,
    },

    SummaryReceived {
        session_id: String,
        message: ChatMessage,
    },

    SummaryFailed {
        session_id: String,
        error: CompletionError,
    },
}

impl Event {
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Event::Reset => None,
            Event::ChooseTopic { session_id, .. }
            | Event::Tick { session_id }
            | Event::ReplyReceived { session_id, .. }
            | Event::ReplyFailed { session_id, .. }
            | Event::RevealDue { session_id, .. }
            | Event::SummaryReceived { session_id, .. }
            | Event::SummaryFailed { session_id, .. } => Some(session_id),
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::ChooseTopic { .. } => "choose_topic",
            Event::Reset => "reset",
            Event::Tick { .. } => "tick",
            Event::ReplyReceived { .. } => "reply_received",
            Event::ReplyFailed { .. } => "reply_failed",
            Event::RevealDue { .. } => "reveal_due",
            Event::SummaryReceived { .. } => "summary_received",
            Event::SummaryFailed { .. } => "summary_failed",
        }
    }
}
