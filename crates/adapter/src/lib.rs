mod commands;
mod dispatch;
mod drivers;
mod registry;
mod router;
mod traits;

pub use commands::{execute, run_command_loop, CommandReply};
pub use dispatch::Dispatcher;
pub use drivers::jsonl::{JsonLinesConfig, JsonLinesSource};
pub use registry::{StreamCounters, StreamSummary};
pub use router::{CommentRouter, Dispatch, EventReceiver, RouteOutcome};
pub use traits::StreamSource;

use domain::{AppCommand, CommandError, IngestEvent, PolicyStore, RequestQueue, Sequenced};
use std::path::PathBuf;
use std::sync::Arc;
use storage::Db;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// --- 信封模式 ---
pub struct CommandEnvelope {
    pub cmd: AppCommand,
    // the API layer waits on this
    pub resp: oneshot::Sender<Result<CommandReply, CommandError>>,
}

#[derive(Clone, Default)]
pub struct AdapterConfig {
    pub todo_xml_path: Option<PathBuf>,
    pub sources: Vec<JsonLinesConfig>,
}

/// Rebuild the router from what the persistence store holds.
pub async fn bootstrap(db: &Db) -> anyhow::Result<(CommentRouter, EventReceiver)> {
    let policy = match db.load_policy().await? {
        Some(p) => PolicyStore::from(p),
        None => {
            info!("No saved policy, starting with default trigger words");
            PolicyStore::default()
        }
    };
    let queue = RequestQueue::from_entries(db.load_requests().await?);
    info!("Restored {} pending requests", queue.len());

    let (router, rx) = CommentRouter::new(policy, queue);
    for stream in db.list_streams().await? {
        router.restore_stream(stream.stream_id, &stream.title);
    }
    Ok((router, rx))
}

pub async fn start_with_cancel_token(
    config: AdapterConfig,
    db: Db,
    router: CommentRouter,
    events: EventReceiver,
    rx_cmd: mpsc::Receiver<CommandEnvelope>,
    tx_ingest: broadcast::Sender<Sequenced<IngestEvent>>,
    cancel_token: CancellationToken,
) -> anyhow::Result<()> {
    // --- 1. 通知分发 ---
    let dispatcher = Dispatcher::new(db, tx_ingest, config.todo_xml_path.clone());
    // stopped last, so events from shutting-down sources are still persisted
    let dispatch_token = CancellationToken::new();
    let dispatch_handle = tokio::spawn(dispatcher.run(events, dispatch_token.clone()));

    // --- 2. 任务：指令处理 ---
    let cmd_handle = tokio::spawn(commands::run_command_loop(
        router.clone(),
        rx_cmd,
        cancel_token.clone(),
    ));

    // --- 3. 任务：直播源 ---
    let sources: Vec<Arc<dyn StreamSource>> = config
        .sources
        .into_iter()
        .map(|c| Arc::new(JsonLinesSource::new(c)) as Arc<dyn StreamSource>)
        .collect();

    let mut source_handles = Vec::with_capacity(sources.len());
    for source in sources {
        let router = router.clone();
        let token = cancel_token.clone();
        router.register_stream(source.stream_id().clone(), source.title());

        source_handles.push(tokio::spawn(async move {
            let stream_id = source.stream_id().clone();
            if let Err(e) = source.run(router.clone(), token).await {
                error!("Stream source {} crashed: {:?}", stream_id, e);
            }
            if let Err(e) = router.set_stream_active(&stream_id, false) {
                error!("Failed to mark stream {} inactive: {}", stream_id, e);
            }
        }));
    }
    info!("Started {} stream sources", source_handles.len());

    // --- 4. 优雅退出 ---
    cancel_token.cancelled().await;
    for handle in source_handles {
        let _ = handle.await;
    }
    let _ = cmd_handle.await;
    dispatch_token.cancel();
    let _ = dispatch_handle.await;
    Ok(())
}
