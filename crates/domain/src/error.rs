use thiserror::Error;

use crate::models::{Identity, StreamId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamIdError {
    #[error("stream id cannot be empty")]
    Empty,
    #[error("stream id cannot contain whitespace")]
    Whitespace,
    #[error("stream id is too long (max {0} chars)")]
    TooLong(usize),
}

/// Rejections from the policy mutation API. None of these are fatal: the
/// caller reports them back to whoever asked for the change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("{list} already contains {} ({}:{})", .identity.name, .identity.platform, .identity.id)]
    AlreadyExists {
        list: PolicyList,
        identity: Identity,
    },

    #[error("{list} has no entry at index {index}")]
    IndexOutOfRange { list: PolicyList, index: usize },

    #[error("trigger word already registered: {0:?}")]
    DuplicateWord(String),

    #[error("trigger word cannot be blank")]
    BlankWord,

    #[error("trigger word not registered: {0:?}")]
    UnknownWord(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyList {
    Managers,
    BlockedUsers,
}

impl std::fmt::Display for PolicyList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Managers => f.write_str("managers"),
            Self::BlockedUsers => f.write_str("blocked users"),
        }
    }
}

/// Why an operator command was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("no request at position {0}")]
    NoSuchRequest(usize),

    #[error("request content cannot be blank")]
    BlankRequest,

    #[error("unknown stream: {0}")]
    UnknownStream(StreamId),
}
