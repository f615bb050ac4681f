use crate::{
    models::{SqlComment, StoredComment},
    Db,
};
use chrono::Utc;
use domain::{Comment, StreamId};

impl Db {
    // 写入评论 (append-only，不更新也不删除)
    pub async fn append_comment(&self, c: &Comment, display_time: &str) -> anyhow::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (
                stream_id, author, author_id, platform,
                message, timestamp, display_time, received_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(c.stream_id.as_str())
        .bind(&c.author)
        .bind(&c.author_id)
        .bind(c.platform.as_str())
        .bind(&c.message)
        .bind(&c.timestamp)
        .bind(display_time)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_comments(
        &self,
        stream_id: &StreamId,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(Vec<StoredComment>, i64)> {
        let rows = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                id, stream_id, author, author_id, platform,
                message, timestamp, display_time, received_at
            FROM comments
            WHERE stream_id = ?
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(stream_id.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE stream_id = ?")
            .bind(stream_id.as_str())
            .fetch_one(&self.pool)
            .await?;

        let comments = rows
            .into_iter()
            .map(StoredComment::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok((comments, count))
    }

    pub async fn get_comment(&self, id: i64) -> anyhow::Result<Option<StoredComment>> {
        let row = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                id, stream_id, author, author_id, platform,
                message, timestamp, display_time, received_at
            FROM comments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredComment::try_from).transpose()
    }
}
