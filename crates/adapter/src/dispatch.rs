use domain::{render_todo_xml, IngestEvent, RequestEntry, Sequenced};
use std::path::PathBuf;
use storage::Db;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::router::EventReceiver;

/// Drains the router's event channel in commit order: persists what needs
/// persisting, refreshes `todo.xml`, then hands the event to display clients.
/// Failures are logged and never fed back into the router.
pub struct Dispatcher {
    db: Db,
    tx_ingest: broadcast::Sender<Sequenced<IngestEvent>>,
    todo_xml_path: Option<PathBuf>,
}

impl Dispatcher {
    pub fn new(
        db: Db,
        tx_ingest: broadcast::Sender<Sequenced<IngestEvent>>,
        todo_xml_path: Option<PathBuf>,
    ) -> Self {
        Self {
            db,
            tx_ingest,
            todo_xml_path,
        }
    }

    pub async fn run(self, mut rx: EventReceiver, cancel_token: CancellationToken) {
        loop {
            tokio::select! {
                ev = rx.recv() => match ev {
                    Some(ev) => self.deliver(ev).await,
                    None => break,
                },
                _ = cancel_token.cancelled() => {
                    // flush whatever was committed before shutdown
                    while let Ok(ev) = rx.try_recv() {
                        self.deliver(ev).await;
                    }
                    break;
                }
            }
        }
        info!("Notification dispatcher stopped");
    }

    async fn deliver(&self, ev: Sequenced<IngestEvent>) {
        debug!(seq = ev.seq, kind = ev.event.kind(), "Dispatching event");
        if let Err(e) = self.persist(&ev.event).await {
            error!("Failed to persist {} event #{}: {:?}", ev.event.kind(), ev.seq, e);
        }
        // no subscribers is fine
        let _ = self.tx_ingest.send(ev);
    }

    async fn persist(&self, event: &IngestEvent) -> anyhow::Result<()> {
        match event {
            IngestEvent::CommentSaved {
                comment,
                display_time,
            } => {
                self.db.append_comment(comment, display_time).await?;
            }
            IngestEvent::QueueUpdated { requests } => {
                let entries: Vec<RequestEntry> = requests.iter().map(|r| r.to_entry()).collect();
                self.db.save_requests(&entries).await?;
                if let Some(path) = &self.todo_xml_path {
                    tokio::fs::write(path, render_todo_xml(requests)).await?;
                }
            }
            IngestEvent::PolicyUpdated { policy } => {
                self.db.save_policy(policy).await?;
            }
            IngestEvent::StreamUpdated {
                stream_id,
                title,
                active,
            } => {
                self.db.upsert_stream(stream_id, title, *active).await?;
            }
            IngestEvent::CountersUpdated { .. } => {}
        }
        Ok(())
    }
}
