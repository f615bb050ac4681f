use adapter::{CommandEnvelope, CommentRouter};
use domain::{IngestEvent, Sequenced};
use storage::Db;
use tokio::sync::{broadcast, mpsc};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub router: CommentRouter,
    pub sender: mpsc::Sender<CommandEnvelope>,
    pub tx_ingest: broadcast::Sender<Sequenced<IngestEvent>>,
    pub admin_token: String,
}
