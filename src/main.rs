use std::sync::Arc;

use mediaforge_server::config::ServerConfig;
use mediaforge_server::http::{state::AppState, HttpServer};
use mediaforge_server::jobs::JobManager;
use mediaforge_server::logging::init_logging;
use mediaforge_server::pipeline::WorkerPool;
use mediaforge_server::processors::{BgRemoveProcessor, ImageConvertProcessor, PdfMergeProcessor, VideoTranscodeProcessor};
use mediaforge_server::reaper::Reaper;
use mediaforge_server::registry::ProcessorRegistry;
use mediaforge_server::store::FileStore;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let _guard = init_logging(&log_dir).map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!("starting mediaforge-server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_env();

    let store = Arc::new(FileStore::new(config.uploads_dir(), config.jobs_dir()));
    let manager = Arc::new(JobManager::new());
    let pool = Arc::new(WorkerPool::new(config.worker_pool_size));

    let registry = Arc::new(
        ProcessorRegistry::builder()
            .register(Arc::new(VideoTranscodeProcessor::new()))
            .register(Arc::new(ImageConvertProcessor::new()))
            .register(Arc::new(PdfMergeProcessor::new()))
            .register(Arc::new(BgRemoveProcessor::new(config.worker_pool_size)))
            .build(),
    );

    let reaper = Arc::new(Reaper::new(manager.clone(), store.clone(), config.reaper_interval_secs, config.job_max_age_secs));

    let state = AppState { manager, registry, store, pool, reaper: reaper.clone() };
    let server = HttpServer::new(config.bind_address.clone(), config.port, config.enable_cors, state);

    let shutdown = server.cancel_token();
    reaper.clone().spawn(shutdown.clone());

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT, initiating shutdown...");
            }
            _ = wait_for_sigterm() => {
                info!("received SIGTERM, initiating shutdown...");
            }
        }
        shutdown.cancel();
    });

    if let Err(err) = server.run().await {
        error!(%err, "server exited with error");
        return Err(err.into());
    }

    info!("mediaforge-server shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    sigterm.recv().await;
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await;
}
