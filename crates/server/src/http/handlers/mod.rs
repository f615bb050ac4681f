pub mod admin;
pub mod comments;
pub mod requests;
pub mod sse;
pub mod streams;

use adapter::{CommandEnvelope, CommandReply};
use axum::{
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::{AppCommand, CommandError, PolicyError};
use tokio::sync::oneshot;

use crate::state::AppState;

pub type ApiError = (StatusCode, String);

pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
        ))?;
    let expected_token = format!("Bearer {}", state.admin_token);
    if auth_header != expected_token {
        return Err((StatusCode::FORBIDDEN, "Invalid Admin Token".to_string()));
    }
    Ok(())
}

/// Hand a command to the worker and wait for its verdict.
pub async fn send_command(
    state: &AppState,
    cmd: AppCommand,
) -> Result<Json<CommandReply>, ApiError> {
    let (tx, rx) = oneshot::channel();
    let envelope = CommandEnvelope { cmd, resp: tx };

    state.sender.send(envelope).await.map_err(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "Worker closed".to_string())
    })?;

    // 等待反馈
    match tokio::time::timeout(std::time::Duration::from_secs(5), rx).await {
        Ok(Ok(Ok(reply))) => Ok(Json(reply)),
        Ok(Ok(Err(e))) => Err((status_for(&e), e.to_string())),
        Ok(Err(_)) => Err((StatusCode::INTERNAL_SERVER_ERROR, "Worker dropped reply".into())),
        Err(_) => Err((StatusCode::GATEWAY_TIMEOUT, "Timeout".into())),
    }
}

pub fn status_for(e: &CommandError) -> StatusCode {
    match e {
        CommandError::Policy(PolicyError::AlreadyExists { .. })
        | CommandError::Policy(PolicyError::DuplicateWord(_)) => StatusCode::CONFLICT,
        CommandError::Policy(PolicyError::IndexOutOfRange { .. })
        | CommandError::Policy(PolicyError::UnknownWord(_))
        | CommandError::NoSuchRequest(_)
        | CommandError::UnknownStream(_) => StatusCode::NOT_FOUND,
        CommandError::Policy(PolicyError::BlankWord) | CommandError::BlankRequest => {
            StatusCode::BAD_REQUEST
        }
    }
}
