use std::sync::Arc;

use anyhow::Context;

use listings_api::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    listings_observability::init();

    let config = ServerConfig::from_env()?;
    let backend = Arc::new(config.backend()?);
    let app = listings_api::app::build_app(backend);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
