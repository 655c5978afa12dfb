//! Display entries and page controls
//!
//! The debate driver never touches markup directly. It emits `DisplayEntry`
//! values and `Controls` snapshots; the display surface renders them.

use crate::completion::Role;
use serde::{Deserialize, Serialize};

/// Who an entry is attributed to. Maps 1:1 onto a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
    Protagonist,
    Antagonist,
    /// Notices (topic prompt, concluding, thinking)
    System,
    /// Non-participating summary
    Moderator,
    Error,
}

impl Speaker {
    pub fn css_class(self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
            Speaker::Protagonist => "protagonist",
            Speaker::Antagonist => "antagonist",
            Speaker::System => "system",
            Speaker::Moderator => "moderator",
            Speaker::Error => "error",
        }
    }

    pub fn from_role(role: Role) -> Self {
        match role {
            Role::System => Speaker::System,
            Role::User => Speaker::User,
            Role::Assistant => Speaker::Assistant,
        }
    }
}

/// One rendered line of the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl DisplayEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Speaker::System, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Speaker::Error, text)
    }

    pub fn moderator(text: impl Into<String>) -> Self {
        Self::new(Speaker::Moderator, text)
    }

    /// Escaped markup for this entry
    pub fn to_markup(&self) -> String {
        format!(
            "<div class=\"message {}\"><p>{}</p></div>",
            self.speaker.css_class(),
            escape_html(&self.text)
        )
    }
}

/// Render a sequence of entries as concatenated markup
pub fn render_markup(entries: &[DisplayEntry]) -> String {
    entries.iter().map(DisplayEntry::to_markup).collect()
}

/// Escape the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Visibility of the page controls, derived from session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    /// Topic buttons
    pub topics_visible: bool,
    /// New-topic button
    pub reset_visible: bool,
    /// Chat history container
    pub chat_visible: bool,
}

impl Controls {
    pub fn topic_selection() -> Self {
        Self {
            topics_visible: true,
            reset_visible: false,
            chat_visible: false,
        }
    }

    pub fn debating() -> Self {
        Self {
            topics_visible: false,
            reset_visible: true,
            chat_visible: true,
        }
    }

    /// Summary shown; the user can pick a new topic or go back
    pub fn concluded() -> Self {
        Self {
            topics_visible: true,
            reset_visible: true,
            chat_visible: true,
        }
    }

    /// Error shown; only the new-topic control is offered
    pub fn errored() -> Self {
        Self {
            topics_visible: false,
            reset_visible: true,
            chat_visible: true,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::topic_selection()
    }
}
