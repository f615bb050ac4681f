use crate::matcher::{MatchPolicy, PermissionFlags};
use crate::models::{Identity, Platform, StreamId};

/// Mutations requested by the operator surface rather than by chat.
#[derive(Debug)]
pub enum AppCommand {
    AddManager(Identity),
    RemoveManager {
        index: usize,
    },
    AddBlockedUser(Identity),
    RemoveBlockedUser {
        index: usize,
    },
    AddPushWord(String),
    RemovePushWord(String),
    AddPullWord(String),
    RemovePullWord(String),
    SetPermissions(PermissionFlags),
    SetMatchPolicy(MatchPolicy),
    AddRequest {
        content: String,
        author: String,
        platform: Platform,
        stream_id: StreamId,
    },
    RemoveRequest {
        number: usize,
    },
    ClearRequests,
    RegisterStream {
        stream_id: StreamId,
        title: String,
    },
    SetStreamActive {
        stream_id: StreamId,
        active: bool,
    },
}

impl AppCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddManager(_) => "add_manager",
            Self::RemoveManager { .. } => "remove_manager",
            Self::AddBlockedUser(_) => "add_blocked_user",
            Self::RemoveBlockedUser { .. } => "remove_blocked_user",
            Self::AddPushWord(_) => "add_push_word",
            Self::RemovePushWord(_) => "remove_push_word",
            Self::AddPullWord(_) => "add_pull_word",
            Self::RemovePullWord(_) => "remove_pull_word",
            Self::SetPermissions(_) => "set_permissions",
            Self::SetMatchPolicy(_) => "set_match_policy",
            Self::AddRequest { .. } => "add_request",
            Self::RemoveRequest { .. } => "remove_request",
            Self::ClearRequests => "clear_requests",
            Self::RegisterStream { .. } => "register_stream",
            Self::SetStreamActive { .. } => "set_stream_active",
        }
    }
}
