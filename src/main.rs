//! Main entry point for the Media Generation Gateway

use media_gen_gateway::{
    api, auth::AuthClient, config::Settings, provider::ProviderRegistry,
    session::MemorySessionStore, storage::AssetStore, AppState,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    if settings.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    info!("Starting Media Generation Gateway");
    info!(
        "Loaded configuration: server={}:{}",
        settings.server.host, settings.server.port
    );

    // Asset storage
    let assets = AssetStore::new(&settings.storage.base_path);
    assets.ensure_dir().await?;

    // Provider adapters, built once from configuration
    let providers = Arc::new(ProviderRegistry::from_settings(&settings)?);

    // Session store and auth client
    let sessions = Arc::new(MemorySessionStore::new());
    let auth = AuthClient::new(&settings.auth)?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    // Create application state
    let app_state = Arc::new(AppState {
        settings,
        providers,
        sessions,
        assets,
        auth,
    });

    // Build the router
    let app = api::routes::create_router(app_state).await;

    info!("Server listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
