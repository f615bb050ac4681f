use domain::{AppCommand, CommandError, Identity, RequestEntry};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::router::CommentRouter;
use crate::CommandEnvelope;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandReply {
    Applied,
    RemovedIdentity { identity: Identity },
    RemovedRequest { request: RequestEntry },
    Cleared { count: usize },
    StreamRegistered { created: bool },
}

pub fn execute(router: &CommentRouter, cmd: AppCommand) -> Result<CommandReply, CommandError> {
    let reply = match cmd {
        AppCommand::AddManager(identity) => {
            router.add_manager(identity)?;
            CommandReply::Applied
        }
        AppCommand::RemoveManager { index } => CommandReply::RemovedIdentity {
            identity: router.remove_manager(index)?,
        },
        AppCommand::AddBlockedUser(identity) => {
            router.add_blocked_user(identity)?;
            CommandReply::Applied
        }
        AppCommand::RemoveBlockedUser { index } => CommandReply::RemovedIdentity {
            identity: router.remove_blocked_user(index)?,
        },
        AppCommand::AddPushWord(word) => {
            router.add_push_word(&word)?;
            CommandReply::Applied
        }
        AppCommand::RemovePushWord(word) => {
            router.remove_push_word(&word)?;
            CommandReply::Applied
        }
        AppCommand::AddPullWord(word) => {
            router.add_pull_word(&word)?;
            CommandReply::Applied
        }
        AppCommand::RemovePullWord(word) => {
            router.remove_pull_word(&word)?;
            CommandReply::Applied
        }
        AppCommand::SetPermissions(flags) => {
            router.set_permissions(flags);
            CommandReply::Applied
        }
        AppCommand::SetMatchPolicy(policy) => {
            router.set_match_policy(policy);
            CommandReply::Applied
        }
        AppCommand::AddRequest {
            content,
            author,
            platform,
            stream_id,
        } => {
            router.add_request(RequestEntry {
                content,
                author,
                platform,
                stream_id,
            })?;
            CommandReply::Applied
        }
        AppCommand::RemoveRequest { number } => CommandReply::RemovedRequest {
            request: router.remove_request(number)?,
        },
        AppCommand::ClearRequests => CommandReply::Cleared {
            count: router.clear_requests(),
        },
        AppCommand::RegisterStream { stream_id, title } => CommandReply::StreamRegistered {
            created: router.register_stream(stream_id, &title),
        },
        AppCommand::SetStreamActive { stream_id, active } => {
            router.set_stream_active(&stream_id, active)?;
            CommandReply::Applied
        }
    };
    Ok(reply)
}

/// Serves operator commands until the channel closes or shutdown is requested.
pub async fn run_command_loop(
    router: CommentRouter,
    mut rx_cmd: mpsc::Receiver<CommandEnvelope>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            cmd_opt = rx_cmd.recv() => {
                let Some(CommandEnvelope { cmd, resp }) = cmd_opt else { break };
                let name = cmd.name();
                let result = execute(&router, cmd);
                match &result {
                    Ok(_) => info!("Command {} applied", name),
                    Err(e) => warn!("Command {} rejected: {}", name, e),
                }
                let _ = resp.send(result);
            },
            _ = cancel_token.cancelled() => break,
        }
    }
}
