use std::{sync::Arc, time::Duration};

use plexporter::{
    common::{AnyResult, logger},
    configs::Config,
    monitoring::{ExporterMetrics, ServerCollector, SessionCollector},
    plex::{LibraryCatalog, PlexListener, PlexServer},
    server::AppState,
    sessions::SessionRegistry,
    transport,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            plexporter::log_println!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    logger::init(config.logging.as_ref());

    if let Err(e) = run(config).await {
        error!("Exporter stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> AnyResult<()> {
    let cancel_token = CancellationToken::new();

    let server = Arc::new(PlexServer::connect(&config.plex).await?);
    let identity = server.identity();
    info!(
        "Connected to '{}' ({}) version {}",
        identity.name, identity.id, identity.version
    );

    let refresh = server
        .clone()
        .spawn_refresh(config.plex.refresh_interval(), cancel_token.child_token());
    let registry = SessionRegistry::start(&config.sessions, &cancel_token);

    let metrics = ExporterMetrics::new();
    metrics.register(SessionCollector::new(registry.clone(), server.clone())?)?;
    metrics.register(ServerCollector::new(server.clone())?)?;

    let state = Arc::new(AppState::new(metrics, registry.clone(), server.clone()));
    let app = transport::http_server::router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let address = config.server.address();
    let tcp_listener = tokio::net::TcpListener::bind(address).await?;
    info!("Serving metrics on http://{}/metrics", address);

    let http_token = cancel_token.clone();
    let http = tokio::spawn(async move {
        axum::serve(tcp_listener, app)
            .with_graceful_shutdown(async move { http_token.cancelled().await })
            .await
    });

    tokio::spawn(shutdown_signal(cancel_token.clone()));

    let listener = PlexListener::new(server, registry.clone());
    let result = listener.run(cancel_token.child_token()).await;

    cancel_token.cancel();
    registry.shutdown().await;
    let _ = refresh.await;

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, http).await {
        Ok(Ok(Err(e))) => error!("HTTP server error: {}", e),
        Ok(Err(e)) => error!("HTTP server task failed: {}", e),
        Err(_) => error!("HTTP server did not drain within {:?}", SHUTDOWN_TIMEOUT),
        Ok(Ok(Ok(()))) => {}
    }

    info!("Shutdown complete");
    result?;
    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = cancel_token.cancelled() => return,
                }
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = cancel_token.cancelled() => return,
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
            _ = cancel_token.cancelled() => return,
        }
    }

    cancel_token.cancel();
}
