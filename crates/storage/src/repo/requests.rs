use crate::{models::SqlRequest, Db};
use domain::RequestEntry;

impl Db {
    /// Replace the stored queue with `entries`, keeping their order.
    pub async fn save_requests(&self, entries: &[RequestEntry]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM requests").execute(&mut *tx).await?;

        for (position, e) in entries.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO requests (position, content, author, platform, stream_id)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(&e.content)
            .bind(&e.author)
            .bind(e.platform.as_str())
            .bind(e.stream_id.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn load_requests(&self) -> anyhow::Result<Vec<RequestEntry>> {
        let rows = sqlx::query_as::<_, SqlRequest>(
            "SELECT content, author, platform, stream_id FROM requests ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RequestEntry::try_from).collect()
    }
}
