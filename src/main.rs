//! automonet routing service entry point.

use tracing_subscriber::EnvFilter;

use automonet::api;
use automonet::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Starting automonet routing service (data dir: {})",
        config.data_dir.display()
    );

    api::serve(config).await
}
