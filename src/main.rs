//! Process entry point: load config, init tracing, bootstrap the
//! dependency bundle, spawn the background sweepers, serve HTTP.

use idleduelist::config::AppConfig;
use idleduelist::context::AppContext;
use idleduelist::sweepers::Sweepers;
use idleduelist::telemetry;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    telemetry::init(config.environment);

    let environment = config.environment;
    let port = config.port;
    let ctx = AppContext::bootstrap(config).await?;
    tracing::info!(?environment, port, "idleduelist server starting");

    let sweepers = Sweepers::spawn(ctx.clone());

    let app = idleduelist::http::build_router(ctx);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweepers.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
