use chrono::NaiveDateTime;
use domain::{Identity, Platform, RequestEntry, StreamId};
use sqlx::FromRow;

fn parse_platform(raw: &str) -> anyhow::Result<Platform> {
    raw.parse::<Platform>().map_err(anyhow::Error::msg)
}

#[derive(FromRow)]
pub struct SqlComment {
    pub id: i64,
    pub stream_id: String,
    pub author: String,
    pub author_id: String,
    pub platform: String,
    pub message: String,
    pub timestamp: Option<String>,
    pub display_time: String,
    pub received_at: NaiveDateTime,
}

/// A persisted comment as listed back to the operator.
#[derive(Debug, Clone)]
pub struct StoredComment {
    pub id: i64,
    pub comment: domain::Comment,
    pub display_time: String,
    pub received_at: NaiveDateTime,
}

impl TryFrom<SqlComment> for StoredComment {
    type Error = anyhow::Error;

    fn try_from(sql: SqlComment) -> anyhow::Result<Self> {
        Ok(StoredComment {
            id: sql.id,
            comment: domain::Comment {
                author: sql.author,
                author_id: sql.author_id,
                platform: parse_platform(&sql.platform)?,
                message: sql.message,
                stream_id: StreamId::new_unchecked(sql.stream_id),
                timestamp: sql.timestamp,
            },
            display_time: sql.display_time,
            received_at: sql.received_at,
        })
    }
}

#[derive(FromRow)]
pub struct SqlIdentity {
    pub kind: String,
    pub platform: String,
    pub user_id: String,
    pub name: String,
}

impl TryFrom<SqlIdentity> for Identity {
    type Error = anyhow::Error;

    fn try_from(sql: SqlIdentity) -> anyhow::Result<Self> {
        Ok(Identity::new(parse_platform(&sql.platform)?, sql.user_id, sql.name))
    }
}

#[derive(FromRow)]
pub struct SqlWord {
    pub kind: String,
    pub word: String,
}

#[derive(FromRow)]
pub struct SqlRequest {
    pub content: String,
    pub author: String,
    pub platform: String,
    pub stream_id: String,
}

impl TryFrom<SqlRequest> for RequestEntry {
    type Error = anyhow::Error;

    fn try_from(sql: SqlRequest) -> anyhow::Result<Self> {
        Ok(RequestEntry {
            content: sql.content,
            author: sql.author,
            platform: parse_platform(&sql.platform)?,
            stream_id: StreamId::new_unchecked(sql.stream_id),
        })
    }
}

#[derive(FromRow)]
pub struct SqlStream {
    pub stream_id: String,
    pub title: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}
