//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::completion::{ChatMessage, CompletionError, CompletionRequest, CompletionService};
use crate::display::{Controls, DisplayEntry, Speaker};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// Mock Completion Service
// ============================================================================

/// Mock completion service that returns queued replies
pub struct MockCompletionService {
    responses: Mutex<VecDeque<Result<ChatMessage, CompletionError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionService {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply with the given content
    pub fn queue_reply(&self, content: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ChatMessage::assistant(content)));
    }

    pub fn queue_error(&self, error: CompletionError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_response(&self) -> Result<ChatMessage, CompletionError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::network("No mock response queued")))
    }
}

impl Default for MockCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<ChatMessage, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_response()
    }

    fn endpoint(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Delayed Mock Completion Service (for cancellation testing)
// ============================================================================

/// Mock completion service with configurable delay
pub struct DelayedMockCompletionService {
    inner: MockCompletionService,
    delay: Duration,
}

impl DelayedMockCompletionService {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockCompletionService::new(),
            delay,
        }
    }

    pub fn queue_reply(&self, content: impl Into<String>) {
        self.inner.queue_reply(content);
    }

    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl CompletionService for DelayedMockCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<ChatMessage, CompletionError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        tokio::time::sleep(self.delay).await;
        self.inner.next_response()
    }

    fn endpoint(&self) -> &str {
        "mock-delayed"
    }
}

// ============================================================================
// Recording Display
// ============================================================================

/// One call made on the display surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    Clear,
    ReplaceAll(Vec<DisplayEntry>),
    Append(DisplayEntry),
    Scroll,
    Loading(bool),
    Controls(Controls),
}

/// Display surface that records every call with the (virtual) time it was made
#[derive(Default)]
pub struct RecordingDisplay {
    calls: Mutex<Vec<(Instant, DisplayCall)>>,
}

impl RecordingDisplay {
    pub fn calls(&self) -> Vec<(Instant, DisplayCall)> {
        self.calls.lock().unwrap().clone()
    }

    /// Entries currently on the page, replaying every call
    pub fn entries(&self) -> Vec<DisplayEntry> {
        let mut entries = Vec::new();
        for (_, call) in self.calls() {
            match call {
                DisplayCall::Clear => entries.clear(),
                DisplayCall::ReplaceAll(all) => entries = all,
                DisplayCall::Append(entry) => entries.push(entry),
                _ => {}
            }
        }
        entries
    }

    /// Entries of one speaker currently on the page
    pub fn entries_by(&self, speaker: Speaker) -> Vec<DisplayEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.speaker == speaker)
            .collect()
    }

    /// Times at which entries were appended
    pub fn appended(&self) -> Vec<(Instant, DisplayEntry)> {
        self.calls()
            .into_iter()
            .filter_map(|(at, call)| match call {
                DisplayCall::Append(entry) => Some((at, entry)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: DisplayCall) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

impl DisplaySurface for RecordingDisplay {
    fn clear(&self) {
        self.record(DisplayCall::Clear);
    }

    fn replace_all(&self, entries: &[DisplayEntry]) {
        self.record(DisplayCall::ReplaceAll(entries.to_vec()));
    }

    fn append(&self, entry: &DisplayEntry) {
        self.record(DisplayCall::Append(entry.clone()));
    }

    fn scroll_to_latest(&self) {
        self.record(DisplayCall::Scroll);
    }

    fn set_loading(&self, visible: bool) {
        self.record(DisplayCall::Loading(visible));
    }

    fn set_controls(&self, controls: Controls) {
        self.record(DisplayCall::Controls(controls));
    }
}

// ============================================================================
// Test Runtime Builder
// ============================================================================

use super::{dispatch, Command, DebateRuntime, DispatchError};
use crate::config::DebateConfig;
use crate::debate::{DebateContext, DebateState, Event, SessionStatus};
use tokio::sync::{mpsc, watch};

/// Helper for building test runtimes with minimal boilerplate
pub struct TestRuntime<C: CompletionService + 'static> {
    pub command_tx: mpsc::Sender<Command>,
    /// Inject events as if they came from a timer or call
    pub event_tx: mpsc::Sender<Event>,
    pub state_rx: watch::Receiver<DebateState>,
    pub service: Arc<C>,
    pub display: Arc<RecordingDisplay>,
    _runtime_handle: tokio::task::JoinHandle<()>,
}

impl TestRuntime<MockCompletionService> {
    /// Create a simple test runtime with an instant mock
    pub fn new() -> TestRuntimeBuilder<MockCompletionService> {
        TestRuntimeBuilder::new()
    }
}

pub struct TestRuntimeBuilder<C> {
    config: DebateConfig,
    service: C,
}

impl TestRuntimeBuilder<MockCompletionService> {
    pub fn new() -> Self {
        Self {
            config: DebateConfig::classic(),
            service: MockCompletionService::new(),
        }
    }
}

impl Default for TestRuntimeBuilder<MockCompletionService> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CompletionService + 'static> TestRuntimeBuilder<C> {
    pub fn config(mut self, config: DebateConfig) -> Self {
        self.config = config;
        self
    }

    pub fn service<S: CompletionService + 'static>(self, service: S) -> TestRuntimeBuilder<S> {
        TestRuntimeBuilder {
            config: self.config,
            service,
        }
    }

    pub fn build(self) -> TestRuntime<C> {
        let service = Arc::new(self.service);
        let display = Arc::new(RecordingDisplay::default());

        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(DebateState::Idle);

        let runtime = DebateRuntime::new(
            DebateContext::new(self.config),
            service.clone(),
            display.clone(),
            command_rx,
            event_rx,
            event_tx.clone(),
            state_tx,
        );
        let handle = tokio::spawn(runtime.run());

        TestRuntime {
            command_tx,
            event_tx,
            state_rx,
            service,
            display,
            _runtime_handle: handle,
        }
    }
}

impl<C: CompletionService + 'static> TestRuntime<C> {
    pub async fn choose_topic(&self, topic_id: &str) -> Result<String, DispatchError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        dispatch(
            &self.command_tx,
            Event::ChooseTopic {
                topic_id: topic_id.to_string(),
                session_id: session_id.clone(),
                requested_at: chrono::Utc::now(),
            },
        )
        .await?;
        Ok(session_id)
    }

    pub async fn reset(&self) {
        dispatch(&self.command_tx, Event::Reset)
            .await
            .expect("Failed to reset");
    }

    /// Wait for a status with timeout
    pub async fn wait_for_status(&self, expected: SessionStatus, timeout: Duration) -> bool {
        let mut rx = self.state_rx.clone();
        tokio::time::timeout(timeout, rx.wait_for(|state| state.status() == expected))
            .await
            .is_ok_and(|r| r.is_ok())
    }

    pub fn state(&self) -> DebateState {
        self.state_rx.borrow().clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionErrorKind;
    use crate::debate::TransitionError;

    const LONG: Duration = Duration::from_secs(600);

    fn small_classic() -> DebateConfig {
        let mut config = DebateConfig::classic();
        config.exchange_threshold = 3;
        config.history_window = 3;
        config
    }

    #[tokio::test]
    async fn test_mock_completion_service() {
        let mock = MockCompletionService::new();
        mock.queue_reply("Hello");

        let request = CompletionRequest {
            messages: vec![],
            temperature: 0.9,
            max_tokens: 10,
            response_format: None,
        };

        let reply = mock.complete(&request).await.unwrap();
        assert_eq!(reply.content, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.complete(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_then_single_summary() {
        let rt = TestRuntime::new().config(small_classic()).build();
        for i in 0..3 {
            rt.service.queue_reply(format!("{{\"response\":\"Point {i}\"}}"));
        }
        rt.service.queue_reply("Both sides were bold. Nobody won.");

        rt.choose_topic("hotdogSandwich").await.unwrap();
        assert!(rt.wait_for_status(SessionStatus::Concluded, LONG).await);

        let requests = rt.service.recorded_requests();
        assert_eq!(requests.len(), 4);

        // Exchange calls carry the JSON envelope request, the summary doesn't
        assert!(requests[..3].iter().all(|r| r.response_format.is_some()));
        let summary = &requests[3];
        assert!(summary.response_format.is_none());
        let transcript = &summary.messages[1].content;
        let labeled: Vec<_> = transcript.lines().skip(1).collect();
        assert_eq!(labeled.len(), 3);
        assert!(labeled.iter().all(|l| l.starts_with("Challenger: ") || l.starts_with("AI Debater: ")));

        let moderator = rt.display.entries_by(Speaker::Moderator);
        assert_eq!(moderator, vec![DisplayEntry::moderator("Both sides were bold. Nobody won.")]);

        // Timer is stopped: nothing else happens
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(rt.service.recorded_requests().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_halts_session() {
        let rt = TestRuntime::new().config(small_classic()).build();
        rt.service.queue_error(CompletionError::from_status(500, "boom"));

        rt.choose_topic("zebraStripes").await.unwrap();
        assert!(rt.wait_for_status(SessionStatus::Errored, LONG).await);

        let DebateState::Errored { error_kind, .. } = rt.state() else {
            panic!("expected Errored");
        };
        assert_eq!(error_kind, Some(CompletionErrorKind::ServerError));

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(rt.service.recorded_requests().len(), 1);
        assert_eq!(
            rt.display.entries_by(Speaker::Error),
            vec![DisplayEntry::error(
                "Error: API request failed: 500 - boom. Auto-refresh paused."
            )]
        );

        // A new topic recovers
        rt.service.queue_reply("{\"response\":\"Back again\"}");
        rt.choose_topic("cerealSoup").await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(rt.service.recorded_requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_stops_ticks() {
        let rt = TestRuntime::new().config(small_classic()).build();
        rt.service.queue_reply("{\"response\":\"never\"}");

        let session_id = rt.choose_topic("flatEarth").await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        rt.reset().await;
        assert_eq!(rt.state(), DebateState::Idle);

        // A tick already queued for the old session changes nothing
        rt.event_tx
            .send(Event::Tick { session_id })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(rt.service.recorded_requests().is_empty());
        assert_eq!(
            rt.display.entries(),
            vec![DisplayEntry::system("Please choose a new topic.")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_after_reset_is_ignored() {
        let rt = TestRuntime::new()
            .config(small_classic())
            .service(DelayedMockCompletionService::new(Duration::from_secs(5)))
            .build();
        rt.service.queue_reply("{\"response\":\"too late\"}");

        rt.choose_topic("cerealSoup").await.unwrap();
        // First tick at 10s; the call is still in flight at 12s
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(rt.service.recorded_requests().len(), 1);

        rt.reset().await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(rt.state(), DebateState::Idle);
        assert_eq!(rt.service.recorded_requests().len(), 1);
        assert!(rt.display.entries_by(Speaker::Assistant).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_choose_topic_rejected_while_running() {
        let rt = TestRuntime::new().config(small_classic()).build();
        rt.choose_topic("flatEarth").await.unwrap();

        let err = rt.choose_topic("cerealSoup").await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Rejected(TransitionError::DebateInProgress)
        ));

        rt.reset().await;
        let err = rt.choose_topic("noSuchTopic").await.unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Rejected(TransitionError::UnknownTopic(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_paired_reveal_is_delayed() {
        let mut config = DebateConfig::paired();
        config.exchange_threshold = 1;
        let rt = TestRuntime::new().config(config).build();
        rt.service
            .queue_reply(r#"{"protagonist":"Pineapple is sunshine.","antagonist":"It is soggy."}"#);
        rt.service.queue_reply("A fruity stalemate.");

        rt.choose_topic("pineapplePizza").await.unwrap();
        assert!(rt.wait_for_status(SessionStatus::Concluded, LONG).await);

        let appended = rt.display.appended();
        let (first_at, first) = appended
            .iter()
            .find(|(_, e)| e.speaker == Speaker::Protagonist)
            .cloned()
            .unwrap();
        let (second_at, second) = appended
            .iter()
            .find(|(_, e)| e.speaker == Speaker::Antagonist)
            .cloned()
            .unwrap();
        assert_eq!(first.text, "Pineapple is sunshine.");
        assert_eq!(second.text, "It is soggy.");
        let gap = second_at - first_at;
        assert!(gap >= Duration::from_secs(3) && gap < Duration::from_secs(4));

        // One exchange call backs both halves, then the summary
        let requests = rt.service.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].messages[1]
            .content
            .contains("Protagonist: Pineapple is sunshine.\nAntagonist: It is soggy.\n"));
    }
}
