use adapter::{CommandReply, StreamSummary};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::{AppCommand, StreamId};
use serde::Deserialize;

use super::{require_admin, send_command, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterStreamBody {
    pub stream_id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Deserialize)]
pub struct ActiveBody {
    pub active: bool,
}

pub async fn list_streams(State(state): State<AppState>) -> Json<Vec<StreamSummary>> {
    Json(state.router.streams())
}

pub async fn register_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterStreamBody>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    let stream_id =
        StreamId::new(payload.stream_id).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    send_command(
        &state,
        AppCommand::RegisterStream {
            stream_id,
            title: payload.title,
        },
    )
    .await
}

pub async fn set_stream_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(stream_id_str): Path<String>,
    Json(payload): Json<ActiveBody>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    let stream_id =
        StreamId::new(stream_id_str).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    send_command(
        &state,
        AppCommand::SetStreamActive {
            stream_id,
            active: payload.active,
        },
    )
    .await
}
