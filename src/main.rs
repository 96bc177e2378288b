use anyhow::Context;
use dotenvy::dotenv;
use log::info;

use nitro::{create_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let addr = config.bind_addr();
    info!("proxying validations to {}", config.api_base());

    let state = AppState::new(config).context("failed to build the upstream client")?;
    let app = create_router(state);

    info!("nitro listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}
