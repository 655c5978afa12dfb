//! JSON-over-HTTP completion endpoint

use super::types::{ChatMessage, CompletionRequest, Role};
use super::{CompletionError, CompletionService};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Reply locations tried in order. The proxy endpoint wraps the upstream
/// body in a `completion` object; a plain OpenAI-style body is accepted too.
const MESSAGE_POINTERS: [&str; 2] = ["/completion/choices/0/message", "/choices/0/message"];

const MISSING_MESSAGE: &str = "Assistant's message not found or invalid in API response.";

/// Completion service that POSTs the request as JSON to a single URL
pub struct HttpCompletionService {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl HttpCompletionService {
    /// Build a client for `endpoint`. `timeout` of `None` waits indefinitely.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, CompletionError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CompletionError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
            model: None,
        })
    }

    /// Send `Authorization: Bearer <key>` with every request
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Add a `model` field to the request body
    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(flatten)]
    request: &'a CompletionRequest,
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<ChatMessage, CompletionError> {
        let body = WireRequest {
            model: self.model.as_deref(),
            request,
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                CompletionError::network(format!("Connection failed: {e}"))
            } else {
                CompletionError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(CompletionError::from_status(status.as_u16(), &text));
        }

        let value: Value = serde_json::from_str(&text)
            .map_err(|e| CompletionError::malformed(format!("Failed to parse response: {e}")))?;

        extract_message(&value)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Pull the assistant message out of a reply body
pub(crate) fn extract_message(body: &Value) -> Result<ChatMessage, CompletionError> {
    let message = MESSAGE_POINTERS
        .iter()
        .find_map(|pointer| body.pointer(pointer))
        .ok_or_else(|| CompletionError::malformed(MISSING_MESSAGE))?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| CompletionError::malformed(MISSING_MESSAGE))?;

    let role = message
        .get("role")
        .cloned()
        .and_then(|r| serde_json::from_value::<Role>(r).ok())
        .unwrap_or(Role::Assistant);

    Ok(ChatMessage::new(role, content))
}
