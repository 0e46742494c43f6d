use std::sync::Arc;

use anyhow::Context;

use shopdesk_api::app::{build_app, build_services};
use shopdesk_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    shopdesk_observability::init(config.log_format);
    tracing::debug!(?config, "configuration loaded");

    let services = Arc::new(build_services(&config).await?);
    let app = build_app(services, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
