//! Effects produced by state transitions

use crate::completion::CompletionRequest;
use crate::display::{Controls, DisplayEntry};
use std::time::Duration;

/// What a completion call is for; decides which event its result becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPurpose {
    Exchange,
    Summary,
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start the periodic tick for a session, replacing any running timer
    StartTimer {
        session_id: String,
        interval: Duration,
    },

    /// Stop the periodic tick
    StopTimer,

    /// Issue a completion call
    RequestCompletion {
        session_id: String,
        purpose: CallPurpose,
        request: CompletionRequest,
    },

    /// Cancel the in-flight call, if any; its result is never delivered
    AbortCompletion,

    /// Deliver `entry` back as `RevealDue` after `delay`
    ScheduleReveal {
        session_id: String,
        delay: Duration,
        entry: DisplayEntry,
    },

    /// Drop a pending reveal
    CancelReveal,

    // Display surface
    ClearDisplay,
    ReplaceAll { entries: Vec<DisplayEntry> },
    Append { entry: DisplayEntry },
    ScrollToLatest,
    SetLoading(bool),
    SetControls(Controls),
}

impl Effect {
    pub fn append(entry: DisplayEntry) -> Self {
        Effect::Append { entry }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Effect::Append {
            entry: DisplayEntry::system(text),
        }
    }

    pub fn error_entry(text: impl Into<String>) -> Self {
        Effect::Append {
            entry: DisplayEntry::error(text),
        }
    }

    pub fn request_exchange(session_id: &str, request: CompletionRequest) -> Self {
        Effect::RequestCompletion {
            session_id: session_id.to_string(),
            purpose: CallPurpose::Exchange,
            request,
        }
    }

    pub fn request_summary(session_id: &str, request: CompletionRequest) -> Self {
        Effect::RequestCompletion {
            session_id: session_id.to_string(),
            purpose: CallPurpose::Summary,
            request,
        }
    }
}
