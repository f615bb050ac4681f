mod config;
mod http;
mod state;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adapter::{AdapterConfig, JsonLinesConfig};
use config::Settings;
use domain::StreamId;
use http::router::build_router;
use state::AppState;
use storage::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;
    let (router, events) = adapter::bootstrap(&db)
        .await
        .context("Failed to restore state from the database")?;

    let (tx_cmd, rx_cmd) = mpsc::channel(100);
    let (tx_ingest, _rx_ingest) = broadcast::channel(256);

    let adapter_config = adapter_config(&settings)?;
    let cancel_token = CancellationToken::new();

    let adapter_handle = tokio::spawn(adapter::start_with_cancel_token(
        adapter_config,
        db.clone(),
        router.clone(),
        events,
        rx_cmd,
        tx_ingest.clone(),
        cancel_token.clone(),
    ));

    let state = AppState {
        db,
        router,
        sender: tx_cmd,
        tx_ingest,
        admin_token: settings.security.admin_token.clone(),
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel_token.cancel();
    match adapter_handle.await {
        Ok(Ok(())) => info!("Adapter stopped"),
        Ok(Err(e)) => tracing::error!("Adapter failed: {:?}", e),
        Err(e) => tracing::error!("Adapter task panicked: {:?}", e),
    }

    Ok(())
}

fn adapter_config(settings: &Settings) -> anyhow::Result<AdapterConfig> {
    let sources = settings
        .sources
        .iter()
        .map(|s| {
            let stream_id = StreamId::new(s.stream_id.as_str())
                .with_context(|| format!("Invalid stream id in sources: {:?}", s.stream_id))?;
            Ok(JsonLinesConfig {
                stream_id,
                title: s.title.clone(),
                platform: s.platform,
                path: PathBuf::from(&s.path),
                follow: s.follow,
                poll_interval: Duration::from_millis(s.poll_interval_ms),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(AdapterConfig {
        todo_xml_path: settings.output.todo_xml_path.as_ref().map(PathBuf::from),
        sources,
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
