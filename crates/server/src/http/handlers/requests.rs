use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use adapter::CommandReply;
use domain::{render_todo_xml, AppCommand, NumberedRequest, Platform, StreamId};
use serde::Deserialize;

use super::{require_admin, send_command, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddRequestBody {
    pub content: String,
    pub stream_id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub platform: Option<Platform>,
}

pub async fn list_requests(State(state): State<AppState>) -> Json<Vec<NumberedRequest>> {
    Json(state.router.requests())
}

pub async fn todo_xml(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        render_todo_xml(&state.router.requests()),
    )
}

pub async fn add_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AddRequestBody>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    let stream_id =
        StreamId::new(payload.stream_id).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let cmd = AppCommand::AddRequest {
        content: payload.content,
        author: payload.author.unwrap_or_else(|| "manual".to_string()),
        platform: payload.platform.unwrap_or(Platform::YouTube),
        stream_id,
    };
    send_command(&state, cmd).await
}

pub async fn delete_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(number): Path<usize>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    send_command(&state, AppCommand::RemoveRequest { number }).await
}

pub async fn clear_requests(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    send_command(&state, AppCommand::ClearRequests).await
}
