//! Chat-completion service abstraction
//!
//! The debate driver only ever needs one operation: send an ordered list of
//! role-tagged messages with sampling parameters, get one message back.

mod error;
mod http;
mod types;

pub use error::{CompletionError, CompletionErrorKind};
pub use http::HttpCompletionService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion endpoints
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &CompletionRequest) -> Result<ChatMessage, CompletionError>;

    /// Endpoint identifier, for logging
    fn endpoint(&self) -> &str;
}

/// Logging wrapper for completion services
pub struct LoggingService {
    inner: Arc<dyn CompletionService>,
    endpoint: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn CompletionService>) -> Self {
        let endpoint = inner.endpoint().to_string();
        Self { inner, endpoint }
    }
}

#[async_trait]
impl CompletionService for LoggingService {
    async fn complete(&self, request: &CompletionRequest) -> Result<ChatMessage, CompletionError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(message) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    reply_chars = message.content.chars().count(),
                    "Completion request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    error = %e.message,
                    kind = ?e.kind,
                    "Completion request failed"
                );
            }
        }

        result
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
