use adapter::CommandReply;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::{AppCommand, Identity, MatchPolicy, PermissionFlags, PolicySnapshot};
use serde::Deserialize;

use super::{require_admin, send_command, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WordBody {
    pub word: String,
}

#[derive(Deserialize)]
pub struct MatchPolicyBody {
    pub policy: MatchPolicy,
}

#[derive(Clone, Copy)]
enum WordKind {
    Push,
    Pull,
}

fn parse_kind(kind: &str) -> Result<WordKind, ApiError> {
    match kind {
        "push" => Ok(WordKind::Push),
        "pull" => Ok(WordKind::Pull),
        other => Err((
            StatusCode::NOT_FOUND,
            format!("unknown word kind: {}", other),
        )),
    }
}

/// Whoever wrote a stored comment.
async fn comment_author(state: &AppState, comment_id: i64) -> Result<Identity, ApiError> {
    let stored = state
        .db
        .get_comment(comment_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("no comment with id {}", comment_id),
            )
        })?;
    Ok(Identity::of_author(&stored.comment))
}

pub async fn get_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PolicySnapshot>, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(state.router.policy()))
}

pub async fn add_manager(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(identity): Json<Identity>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    send_command(&state, AppCommand::AddManager(identity)).await
}

pub async fn remove_manager(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    send_command(&state, AppCommand::RemoveManager { index }).await
}

pub async fn add_manager_from_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<i64>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    let identity = comment_author(&state, comment_id).await?;
    send_command(&state, AppCommand::AddManager(identity)).await
}

pub async fn add_blocked_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(identity): Json<Identity>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    send_command(&state, AppCommand::AddBlockedUser(identity)).await
}

pub async fn remove_blocked_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(index): Path<usize>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    send_command(&state, AppCommand::RemoveBlockedUser { index }).await
}

pub async fn add_blocked_user_from_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(comment_id): Path<i64>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    let identity = comment_author(&state, comment_id).await?;
    send_command(&state, AppCommand::AddBlockedUser(identity)).await
}

pub async fn add_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Json(body): Json<WordBody>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    let cmd = match parse_kind(&kind)? {
        WordKind::Push => AppCommand::AddPushWord(body.word),
        WordKind::Pull => AppCommand::AddPullWord(body.word),
    };
    send_command(&state, cmd).await
}

pub async fn remove_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Json(body): Json<WordBody>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    let cmd = match parse_kind(&kind)? {
        WordKind::Push => AppCommand::RemovePushWord(body.word),
        WordKind::Pull => AppCommand::RemovePullWord(body.word),
    };
    send_command(&state, cmd).await
}

pub async fn set_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(flags): Json<PermissionFlags>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    send_command(&state, AppCommand::SetPermissions(flags)).await
}

pub async fn set_match_policy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<MatchPolicyBody>,
) -> Result<Json<CommandReply>, ApiError> {
    require_admin(&state, &headers)?;
    send_command(&state, AppCommand::SetMatchPolicy(body.policy)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handlers::test_support::{admin_headers, state};
    use domain::{Comment, Platform, StreamId};

    fn mod_identity() -> Identity {
        Identity::new(Platform::YouTube, "UCmod", "mod")
    }

    #[tokio::test]
    async fn missing_or_wrong_token_is_rejected() {
        let state = state().await;
        let err = get_policy(State(state.clone()), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Bearer nope".parse().unwrap());
        let err = get_policy(State(state), headers).await.unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn manager_lifecycle() {
        let state = state().await;
        add_manager(State(state.clone()), admin_headers(), Json(mod_identity()))
            .await
            .unwrap();

        let err = add_manager(State(state.clone()), admin_headers(), Json(mod_identity()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        let Json(policy) = get_policy(State(state.clone()), admin_headers()).await.unwrap();
        assert_eq!(policy.managers, vec![mod_identity()]);

        let Json(reply) = remove_manager(State(state.clone()), admin_headers(), Path(0))
            .await
            .unwrap();
        assert_eq!(
            reply,
            CommandReply::RemovedIdentity {
                identity: mod_identity()
            }
        );

        let err = remove_manager(State(state), admin_headers(), Path(0))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    async fn stored_comment(state: &AppState, author_id: &str) -> i64 {
        let comment = Comment {
            author: format!("viewer {}", author_id),
            author_id: author_id.into(),
            platform: Platform::Twitch,
            message: "hello".into(),
            stream_id: StreamId::new_unchecked("live".into()),
            timestamp: None,
        };
        state
            .db
            .append_comment(&comment, "2024-01-01 00:00:00")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn promote_comment_author_to_manager() {
        let state = state().await;
        let id = stored_comment(&state, "42").await;

        add_manager_from_comment(State(state.clone()), admin_headers(), Path(id))
            .await
            .unwrap();
        let managers = state.router.policy().managers;
        assert_eq!(managers, vec![Identity::new(Platform::Twitch, "42", "")]);
        assert_eq!(managers[0].name, "viewer 42");

        let err = add_manager_from_comment(State(state.clone()), admin_headers(), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        let err = add_manager_from_comment(State(state), admin_headers(), Path(id + 100))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn block_comment_author() {
        let state = state().await;
        let id = stored_comment(&state, "troll").await;

        add_blocked_user_from_comment(State(state.clone()), admin_headers(), Path(id))
            .await
            .unwrap();
        assert!(state
            .router
            .policy()
            .blocked_users
            .contains(&Identity::new(Platform::Twitch, "troll", "")));

        let err = add_blocked_user_from_comment(State(state.clone()), admin_headers(), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        let err = add_blocked_user_from_comment(State(state), HeaderMap::new(), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn words_by_kind() {
        let state = state().await;
        add_word(
            State(state.clone()),
            admin_headers(),
            Path("pull".into()),
            Json(WordBody { word: "消化".into() }),
        )
        .await
        .unwrap();
        assert!(state
            .router
            .policy()
            .words
            .pull_words
            .contains(&"消化".to_string()));

        let err = add_word(
            State(state.clone()),
            admin_headers(),
            Path("sideways".into()),
            Json(WordBody { word: "x".into() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = add_word(
            State(state),
            admin_headers(),
            Path("push".into()),
            Json(WordBody { word: "  ".into() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn gates_and_match_policy() {
        let state = state().await;
        set_permissions(
            State(state.clone()),
            admin_headers(),
            Json(PermissionFlags {
                push_manager_only: true,
                pull_manager_only: false,
            }),
        )
        .await
        .unwrap();
        set_match_policy(
            State(state.clone()),
            admin_headers(),
            Json(MatchPolicyBody {
                policy: MatchPolicy::Exclusive,
            }),
        )
        .await
        .unwrap();

        let policy = state.router.policy();
        assert!(policy.flags.push_manager_only);
        assert_eq!(policy.match_policy, MatchPolicy::Exclusive);
    }
}
