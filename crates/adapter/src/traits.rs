use anyhow::Result;
use async_trait::async_trait;
use domain::StreamId;
use tokio_util::sync::CancellationToken;

use crate::router::CommentRouter;

/// One live stream's chat feed. Each source runs in its own task and hands
/// comments to the router one at a time, in arrival order.
#[async_trait]
pub trait StreamSource: Send + Sync {
    fn stream_id(&self) -> &StreamId;

    fn title(&self) -> &str;

    async fn run(&self, router: CommentRouter, cancel_token: CancellationToken) -> Result<()>;
}
