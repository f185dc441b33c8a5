use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moviematch_api::{
    config::Config,
    routes::{create_router, AppState},
};

fn init_tracing(log_format: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "moviematch_api=debug,tower_http=debug".into());

    match log_format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_format);

    let bind_address = config.bind_address();
    tracing::info!(
        max_retries = config.max_retries,
        request_timeout_ms = config.request_timeout_ms,
        enrichment_concurrency = config.enrichment_concurrency,
        "Configuration loaded"
    );

    let app = create_router(AppState::from_config(config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, "Movie Match Service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
