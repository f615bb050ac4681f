use adapter::RouteOutcome;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::{Comment, StreamId};
use serde::{Deserialize, Serialize};

use super::{require_admin, ApiError};
use crate::state::AppState;

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestResponse {
    Blocked,
    UnknownStream,
    Processed {
        added: bool,
        removed: usize,
        denied: bool,
    },
}

impl From<RouteOutcome> for IngestResponse {
    fn from(outcome: RouteOutcome) -> Self {
        match outcome {
            RouteOutcome::Blocked => Self::Blocked,
            RouteOutcome::UnknownStream => Self::UnknownStream,
            RouteOutcome::Processed(d) => Self::Processed {
                added: d.added,
                removed: d.removed,
                denied: d.add_denied || d.remove_denied,
            },
        }
    }
}

/// Ingestion endpoint for chat collectors that push instead of being read
/// from a file.
pub async fn post_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(comment): Json<Comment>,
) -> Result<Json<IngestResponse>, ApiError> {
    require_admin(&state, &headers)?;
    StreamId::new(comment.stream_id.as_str())
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let outcome = state.router.process_comment(comment);
    Ok(Json(outcome.into()))
}

#[derive(Deserialize)]
pub struct Page {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

#[derive(Serialize)]
pub struct StoredCommentView {
    pub id: i64,
    #[serde(flatten)]
    pub comment: Comment,
    pub display_time: String,
}

#[derive(Serialize)]
pub struct CommentPage {
    pub total: i64,
    pub comments: Vec<StoredCommentView>,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(stream_id_str): Path<String>,
    Query(page): Query<Page>,
) -> Result<Json<CommentPage>, ApiError> {
    let stream_id =
        StreamId::new(stream_id_str).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let (rows, total) = state
        .db
        .list_comments(&stream_id, page.limit.clamp(1, 1000), page.offset.max(0))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let comments = rows
        .into_iter()
        .map(|r| StoredCommentView {
            id: r.id,
            comment: r.comment,
            display_time: r.display_time,
        })
        .collect();
    Ok(Json(CommentPage { total, comments }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handlers::test_support::{admin_headers, state};
    use domain::Platform;

    fn comment(stream: &str, message: &str) -> Comment {
        Comment {
            author: "viewer".into(),
            author_id: "UC1".into(),
            platform: Platform::YouTube,
            message: message.into(),
            stream_id: StreamId::new_unchecked(stream.into()),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn ingested_comment_drives_the_queue() {
        let state = state().await;
        let Json(resp) = post_comment(
            State(state.clone()),
            admin_headers(),
            Json(comment("live", "お題 テスト")),
        )
        .await
        .unwrap();
        assert_eq!(
            resp,
            IngestResponse::Processed {
                added: true,
                removed: 0,
                denied: false
            }
        );
        assert_eq!(state.router.requests()[0].content, "テスト");

        let Json(resp) = post_comment(
            State(state),
            admin_headers(),
            Json(comment("missing", "お題 x")),
        )
        .await
        .unwrap();
        assert_eq!(resp, IngestResponse::UnknownStream);
    }

    #[tokio::test]
    async fn malformed_stream_id_is_rejected() {
        let state = state().await;
        let err = post_comment(State(state), admin_headers(), Json(comment("", "hi")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}
