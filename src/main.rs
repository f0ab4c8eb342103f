use job_marketplace_backend::{
    config::Config,
    database::pool::{create_pool, run_migrations},
    routes::api_router,
    services::{
        housekeeping_service::HousekeepingService,
        mail_service::{EmailSender, SmtpSender},
        queue_service::TaskProcessor,
        task_handlers::build_task_mux,
    },
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = config.server_address.parse()?;
    let concurrency = config.task_worker_concurrency;

    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let mailer: Arc<dyn EmailSender> = Arc::new(SmtpSender::new(&config)?);
    let app_base_url = config.app_base_url.clone();
    let app_state = AppState::new(pool.clone(), config)?;

    match app_state.job_service.rebuild_search_index().await {
        Ok(count) => info!(count, "search index loaded"),
        Err(e) => tracing::error!(error = ?e, "initial search index load failed"),
    }

    let shutdown = CancellationToken::new();
    let mux = build_task_mux(
        pool.clone(),
        mailer,
        app_state.search_index.clone(),
        app_base_url,
    );
    let workers = TaskProcessor::new(pool.clone(), mux).start(concurrency, shutdown.clone());

    let mut scheduler = HousekeepingService::new(pool).start().await?;

    let app = api_router(app_state);
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!(error = ?e, "task worker panicked");
        }
    }
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = ?e, "scheduler shutdown failed");
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "failed to listen for ctrl-c");
    }
    info!("shutdown signal received");
    shutdown.cancel();
}
