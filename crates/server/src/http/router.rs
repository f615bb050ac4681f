use super::handlers::{admin, comments, requests, sse, streams};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

const METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(METHODS).allow_headers(Any);
    if allowed_origins == "*" {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
        base.allow_origin(Any)
    } else {
        tracing::info!("CORS enabled for origins: {:?}", origins);
        base.allow_origin(origins)
    }
}

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let admin = Router::new()
        .route("/policy", get(admin::get_policy))
        .route("/managers", post(admin::add_manager))
        .route("/managers/:index", delete(admin::remove_manager))
        .route(
            "/managers/from-comment/:comment_id",
            post(admin::add_manager_from_comment),
        )
        .route("/blocked", post(admin::add_blocked_user))
        .route("/blocked/:index", delete(admin::remove_blocked_user))
        .route(
            "/blocked/from-comment/:comment_id",
            post(admin::add_blocked_user_from_comment),
        )
        .route(
            "/words/:kind",
            post(admin::add_word).delete(admin::remove_word),
        )
        .route("/permissions", put(admin::set_permissions))
        .route("/match-policy", put(admin::set_match_policy));

    Router::new()
        .route(
            "/api/requests",
            get(requests::list_requests).post(requests::add_request),
        )
        .route("/api/requests/clear", post(requests::clear_requests))
        .route("/api/requests/todo.xml", get(requests::todo_xml))
        .route("/api/requests/:number", delete(requests::delete_request))
        .route("/api/comments", post(comments::post_comment))
        .route(
            "/api/streams",
            get(streams::list_streams).post(streams::register_stream),
        )
        .route("/api/streams/:stream_id/active", post(streams::set_stream_active))
        .route("/api/streams/:stream_id/comments", get(comments::list_comments))
        .route("/api/streams/:stream_id/events", get(sse::stream_events))
        .route("/api/events", get(sse::all_events))
        .nest("/api/admin", admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
