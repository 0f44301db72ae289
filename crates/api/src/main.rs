use anyhow::Context;

use envios_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    envios_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let (app, services) = envios_api::app::build_app(&config)
        .await
        .context("failed to build application services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    services.shutdown().await;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
