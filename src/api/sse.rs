//! Server-Sent Events support

use crate::debate::DebateState;
use crate::runtime::SseEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::StreamExt;

/// Page updates followed by state changes, after an initial snapshot
pub fn sse_stream(
    init_event: SseEvent,
    broadcast_rx: broadcast::Receiver<SseEvent>,
    state_rx: watch::Receiver<DebateState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move { Ok::<_, Infallible>(sse_event_to_axum(init_event)) });

    // A lagged client has lost updates; tell it to resync from a fresh init
    let broadcasts = BroadcastStream::new(broadcast_rx).map(|result| {
        let event = result.unwrap_or_else(|e| SseEvent::Error {
            message: e.to_string(),
        });
        Ok::<_, Infallible>(sse_event_to_axum(event))
    });

    let states = WatchStream::from_changes(state_rx).map(|state| {
        Ok(sse_event_to_axum(SseEvent::StateChange {
            state: state_to_json(&state),
        }))
    });

    let combined = init.chain(broadcasts.merge(states));

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

pub fn state_to_json(state: &DebateState) -> Value {
    serde_json::to_value(state).unwrap_or(Value::Null)
}

fn sse_event_to_axum(event: SseEvent) -> Event {
    let (event_type, data) = sse_event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn sse_event_payload(event: SseEvent) -> (&'static str, Value) {
    match event {
        SseEvent::Init {
            markup,
            controls,
            loading,
            state,
        } => (
            "init",
            json!({
                "type": "init",
                "markup": markup,
                "controls": controls,
                "loading": loading,
                "state": state
            }),
        ),
        SseEvent::ReplaceAll { markup } => (
            "replace_all",
            json!({
                "type": "replace_all",
                "markup": markup
            }),
        ),
        SseEvent::Append { markup } => (
            "append",
            json!({
                "type": "append",
                "markup": markup
            }),
        ),
        SseEvent::Clear => ("clear", json!({ "type": "clear" })),
        SseEvent::Scroll => ("scroll", json!({ "type": "scroll" })),
        SseEvent::Loading { visible } => (
            "loading",
            json!({
                "type": "loading",
                "visible": visible
            }),
        ),
        SseEvent::Controls(controls) => (
            "controls",
            json!({
                "type": "controls",
                "controls": controls
            }),
        ),
        SseEvent::StateChange { state } => (
            "status",
            json!({
                "type": "status",
                "status": state.get("type").cloned().unwrap_or(Value::Null),
                "state": state
            }),
        ),
        SseEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    }
}
