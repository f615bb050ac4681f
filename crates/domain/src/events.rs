use crate::models::{Comment, NumberedRequest, StreamId};
use crate::policy::PolicySnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngestEvent {
    CommentSaved {
        comment: Comment,
        display_time: String,
    },
    QueueUpdated {
        requests: Vec<NumberedRequest>,
    },
    CountersUpdated {
        stream_id: StreamId,
        comments: u64,
        processed_requests: u64,
    },
    PolicyUpdated {
        policy: PolicySnapshot,
    },
    StreamUpdated {
        stream_id: StreamId,
        title: String,
        active: bool,
    },
}

impl IngestEvent {
    /// Events tied to one stream; queue and policy events are global.
    pub fn stream_id(&self) -> Option<&StreamId> {
        match self {
            Self::CommentSaved { comment, .. } => Some(&comment.stream_id),
            Self::CountersUpdated { stream_id, .. } | Self::StreamUpdated { stream_id, .. } => {
                Some(stream_id)
            }
            Self::QueueUpdated { .. } | Self::PolicyUpdated { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommentSaved { .. } => "comment",
            Self::QueueUpdated { .. } => "queue",
            Self::CountersUpdated { .. } => "counters",
            Self::PolicyUpdated { .. } => "policy",
            Self::StreamUpdated { .. } => "stream",
        }
    }
}

/// An event stamped with its commit order. `seq` strictly increases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequenced<T> {
    pub seq: u64,
    #[serde(flatten)]
    pub event: T,
}
