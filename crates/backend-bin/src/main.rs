use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use backend_lib::{config::Settings, router, store::MemoryUserStore, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration: defaults < config.toml < VIDSTREAM_* env
    let config = Settings::load()?;

    // Initialize tracing from the configured level
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if config.access_token_secret == config.renewal_token_secret {
        anyhow::bail!("access and renewal signing secrets must differ");
    }

    // Create storage and application state
    let store = MemoryUserStore::new();
    let addr = config.bind_addr;
    let state = Arc::new(AppState::new(store, config));

    // Create the router
    let app = router::create_router(state);

    // Start the server
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "identity backend listening");

    axum::serve(listener, app).await?;

    Ok(())
}
