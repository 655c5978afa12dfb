//! Conversation log
//!
//! The instruction message is held apart from the exchange turns, so it is
//! always first, never swapped and never evicted.

use super::content::{display_text, paired_turns, ReplyTurns};
use crate::completion::{ChatMessage, Role};
use crate::config::{TranscriptLabels, TurnStructure};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationLog {
    instruction: ChatMessage,
    turns: Vec<ChatMessage>,
}

impl ConversationLog {
    /// Log with an instruction message and an opening message
    pub fn seeded(instruction: impl Into<String>, opening: ChatMessage) -> Self {
        Self {
            instruction: ChatMessage::system(instruction),
            turns: vec![opening],
        }
    }

    pub fn instruction(&self) -> &ChatMessage {
        &self.instruction
    }

    /// Exchange messages, oldest first
    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.turns.push(message);
    }

    /// Keep only the most recent `window` exchange messages
    pub fn truncate(&mut self, window: usize) {
        let excess = self.turns.len().saturating_sub(window);
        self.turns.drain(..excess);
    }

    /// Flip user/assistant on every exchange message
    pub fn swap_roles(&mut self) {
        for message in &mut self.turns {
            message.role = message.role.swapped();
        }
    }

    /// Full message list as sent to the completion service
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        std::iter::once(self.instruction.clone())
            .chain(self.turns.iter().cloned())
            .collect()
    }

    /// Plain-text transcript for the moderator, one labeled line per turn
    pub fn transcript(
        &self,
        topic_name: &str,
        labels: &TranscriptLabels,
        structure: &TurnStructure,
    ) -> String {
        let mut out = format!("Debate on \"{topic_name}\":\n");
        let role_label = |role: Role| match role {
            Role::User => labels.user.as_str(),
            Role::Assistant | Role::System => labels.assistant.as_str(),
        };

        for message in &self.turns {
            match structure {
                TurnStructure::Alternating { reply_field } => {
                    let text = display_text(&message.content, reply_field);
                    let _ = writeln!(out, "{}: {text}", role_label(message.role));
                }
                TurnStructure::Paired {
                    first_field,
                    second_field,
                    ..
                } => match paired_turns(&message.content, first_field, second_field) {
                    ReplyTurns::Pair { first, second } => {
                        let _ = writeln!(out, "{}: {first}", labels.first);
                        let _ = writeln!(out, "{}: {second}", labels.second);
                    }
                    ReplyTurns::Single(text) => {
                        let _ = writeln!(out, "{}: {text}", role_label(message.role));
                    }
                },
            }
        }
        out
    }
}
