//! API request and response types

use crate::debate::SessionStatus;
use crate::display::Controls;
use serde::{Deserialize, Serialize};

/// One selectable topic
#[derive(Debug, Serialize)]
pub struct TopicResponse {
    pub id: String,
    pub display_name: String,
}

/// Response with the variant's topic list
#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub variant: String,
    pub topics: Vec<TopicResponse>,
}

/// Request to start a debate
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub topic_id: String,
}

/// Response for a started debate
#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub session_id: String,
}

/// Current debate state
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub topic: Option<String>,
    pub exchanges: u32,
    pub exchange_threshold: u32,
    pub controls: Controls,
    pub loading: bool,
    /// Full state as JSON object
    pub state: serde_json::Value,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
