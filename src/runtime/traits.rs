//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use super::SseEvent;
use crate::completion::{ChatMessage, CompletionError, CompletionRequest, CompletionService};
use crate::display::{render_markup, Controls, DisplayEntry};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Where debate output is rendered
pub trait DisplaySurface: Send + Sync {
    fn clear(&self);

    /// Replace everything shown with `entries`, in order
    fn replace_all(&self, entries: &[DisplayEntry]);

    fn append(&self, entry: &DisplayEntry);

    fn scroll_to_latest(&self);

    fn set_loading(&self, visible: bool);

    fn set_controls(&self, controls: Controls);
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

impl<T: DisplaySurface + ?Sized> DisplaySurface for Arc<T> {
    fn clear(&self) {
        (**self).clear();
    }

    fn replace_all(&self, entries: &[DisplayEntry]) {
        (**self).replace_all(entries);
    }

    fn append(&self, entry: &DisplayEntry) {
        (**self).append(entry);
    }

    fn scroll_to_latest(&self) {
        (**self).scroll_to_latest();
    }

    fn set_loading(&self, visible: bool) {
        (**self).set_loading(visible);
    }

    fn set_controls(&self, controls: Controls) {
        (**self).set_controls(controls);
    }
}

#[async_trait]
impl<T: CompletionService + ?Sized> CompletionService for Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<ChatMessage, CompletionError> {
        (**self).complete(request).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// What a freshly connected page needs to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSnapshot {
    pub entries: Vec<DisplayEntry>,
    pub controls: Controls,
    pub loading: bool,
}

impl PageSnapshot {
    pub fn markup(&self) -> String {
        render_markup(&self.entries)
    }
}

/// Display surface that keeps a page snapshot and fans changes out to
/// connected SSE clients
pub struct BroadcastDisplay {
    page: Mutex<PageSnapshot>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl BroadcastDisplay {
    pub fn new(capacity: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(capacity);
        Self {
            page: Mutex::new(PageSnapshot::default()),
            broadcast_tx,
        }
    }

    /// Current page plus a receiver for every change after it
    pub fn subscribe(&self) -> (PageSnapshot, broadcast::Receiver<SseEvent>) {
        let page = self.page();
        (page.clone(), self.broadcast_tx.subscribe())
    }

    pub fn snapshot(&self) -> PageSnapshot {
        self.page().clone()
    }

    // A panic while holding the lock cannot leave the snapshot half-written
    fn page(&self) -> MutexGuard<'_, PageSnapshot> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change and broadcast it while holding the lock, so a
    /// concurrent `subscribe` sees either both or neither
    fn update(&self, apply: impl FnOnce(&mut PageSnapshot), event: SseEvent) {
        let mut page = self.page();
        apply(&mut page);
        // No receivers is fine
        let _ = self.broadcast_tx.send(event);
    }
}

impl DisplaySurface for BroadcastDisplay {
    fn clear(&self) {
        self.update(|page| page.entries.clear(), SseEvent::Clear);
    }

    fn replace_all(&self, entries: &[DisplayEntry]) {
        self.update(
            |page| page.entries = entries.to_vec(),
            SseEvent::ReplaceAll {
                markup: render_markup(entries),
            },
        );
    }

    fn append(&self, entry: &DisplayEntry) {
        self.update(
            |page| page.entries.push(entry.clone()),
            SseEvent::Append {
                markup: entry.to_markup(),
            },
        );
    }

    fn scroll_to_latest(&self) {
        self.update(|_| {}, SseEvent::Scroll);
    }

    fn set_loading(&self, visible: bool) {
        self.update(|page| page.loading = visible, SseEvent::Loading { visible });
    }

    fn set_controls(&self, controls: Controls) {
        self.update(|page| page.controls = controls, SseEvent::Controls(controls));
    }
}
