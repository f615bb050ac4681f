use crate::{models::SqlStream, Db};
use chrono::{NaiveDateTime, Utc};
use domain::StreamId;

#[derive(Debug, Clone)]
pub struct StoredStream {
    pub stream_id: StreamId,
    pub title: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl From<SqlStream> for StoredStream {
    fn from(sql: SqlStream) -> Self {
        StoredStream {
            stream_id: StreamId::new_unchecked(sql.stream_id),
            title: sql.title,
            active: sql.active,
            created_at: sql.created_at,
        }
    }
}

impl Db {
    /// Insert or refresh a stream. An existing `created_at` is kept.
    pub async fn upsert_stream(
        &self,
        stream_id: &StreamId,
        title: &str,
        active: bool,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO streams (stream_id, title, active, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(stream_id) DO UPDATE SET
                title = excluded.title,
                active = excluded.active
            "#,
        )
        .bind(stream_id.as_str())
        .bind(title)
        .bind(active)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_streams(&self) -> anyhow::Result<Vec<StoredStream>> {
        let rows = sqlx::query_as::<_, SqlStream>(
            "SELECT stream_id, title, active, created_at FROM streams ORDER BY created_at ASC, stream_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
