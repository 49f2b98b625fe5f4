use inkpress::config::AppConfig;
use inkpress::db::{DocumentStore, MemoryStore, PostgresStore};
use inkpress::embeddings::{Embedder, GeminiEmbedder, MockEmbedder};
use inkpress::index::{MemoryVectorIndex, PgVectorIndex, VectorIndex};
use inkpress::llm::{GeminiGenerator, MockGenerator, TextGenerator};
use inkpress::metrics::setup_metrics;
use inkpress::routes::{create_router, RouterOptions};
use inkpress::services::papers::ArxivClient;
use inkpress::services::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::build()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.rust_log))
        .with_target(true)
        .init();

    if let Err(e) = config.validate_live() {
        error!(error = %e, "invalid configuration");
        return Err(e.into());
    }

    info!(mode = %config.mode, "starting inkpress");

    let (store, index, embedder, generator): (
        Arc<dyn DocumentStore>,
        Arc<dyn VectorIndex>,
        Arc<dyn Embedder>,
        Arc<dyn TextGenerator>,
    ) = if config.mode == "mock" {
        warn!("mock mode: in-memory store and model stubs, nothing is persisted");
        (
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryVectorIndex::new()),
            Arc::new(MockEmbedder::new(config.embeddings.dimension)),
            Arc::new(MockGenerator::new()),
        )
    } else {
        info!("connecting to database...");
        let db = PostgresStore::connect(&config.database).await?;
        let index = PgVectorIndex::new(db.clone(), config.embeddings.dimension);
        (
            Arc::new(PostgresStore::new(db)),
            Arc::new(index),
            Arc::new(GeminiEmbedder::new(config.embeddings.clone())?),
            Arc::new(GeminiGenerator::new(config.llm.clone())?),
        )
    };

    let provider = Arc::new(ArxivClient::new(&config.arxiv)?);

    // Table/extension setup runs in the background; a failure degrades
    // retrieval but should not block post CRUD
    {
        let index = index.clone();
        tokio::spawn(async move {
            if let Err(e) = index.ensure_indexes().await {
                error!(error = %e, "vector index setup failed");
            }
        });
    }

    let state = AppState::new(store, index, embedder, generator, provider, &config);

    let (metrics_layer, metrics_router) = setup_metrics();
    let app = create_router(
        state,
        RouterOptions {
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            max_concurrency: config.server.max_concurrent_requests,
        },
    )
    .merge(metrics_router)
    .layer(metrics_layer);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("received SIGTERM, starting shutdown..."),
    }
}
