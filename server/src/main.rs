// RT/RW administration server
// Entry point and application setup

use rtrw::{api, app, config::ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rtrw=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RT/RW administration server");

    let config = ServerConfig::from_env()?;
    let (state, scheduler) = app::setup(&config).await?;

    let served = api::serve(state, config.bind_addr).await;

    if let Err(e) = scheduler.shutdown().await {
        tracing::error!("Failed to stop scheduler: {}", e);
    }

    served?;
    Ok(())
}
