use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use domain::{IngestEvent, Sequenced, StreamId};
use futures::stream::{self, Stream};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};

use super::ApiError;
use crate::state::AppState;

type EventResult = Result<Event, axum::Error>;

/// Every committed event, for overlays that show the whole session.
pub async fn all_events(State(state): State<AppState>) -> Sse<impl Stream<Item = EventResult>> {
    tracing::info!("SSE Connected: all streams");
    event_stream(state, None)
}

/// Events for one stream, plus the global ones (queue, policy).
pub async fn stream_events(
    State(state): State<AppState>,
    Path(stream_id_str): Path<String>,
) -> Result<Sse<impl Stream<Item = EventResult>>, ApiError> {
    let stream_id =
        StreamId::new(stream_id_str).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    tracing::info!("SSE Connected: stream={}", stream_id);
    Ok(event_stream(state, Some(stream_id)))
}

fn event_stream(
    state: AppState,
    filter: Option<StreamId>,
) -> Sse<impl Stream<Item = EventResult>> {
    // subscribe before snapshotting so nothing committed in between is missed
    let rx = state.tx_ingest.subscribe();

    let snapshot = Event::default()
        .event("snapshot")
        .json_data(serde_json::json!({
            "requests": state.router.requests(),
            "streams": state.router.streams(),
        }))
        .map_err(axum::Error::new);

    let live = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(ev) if passes(&ev, filter.as_ref()) => Some(to_sse(&ev)),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!("SSE client lagged, skipped {} events", n);
            None
        }
    });

    Sse::new(stream::once(async move { snapshot }).chain(live))
        .keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}

fn passes(ev: &Sequenced<IngestEvent>, filter: Option<&StreamId>) -> bool {
    match (filter, ev.event.stream_id()) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => true,
    }
}

fn to_sse(ev: &Sequenced<IngestEvent>) -> EventResult {
    Event::default()
        .event(ev.event.kind())
        .id(ev.seq.to_string())
        .json_data(&ev.event)
        .map_err(|e| {
            tracing::error!("SSE serialization error: {}", e);
            axum::Error::new(e)
        })
}
