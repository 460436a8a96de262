mod configuration;
mod error;
mod opener;
mod routes;
mod state;

use ait::coordinator::Coordinator;
use ait::providers::factory::StoreResolver;
use ait::store::{ConfigStore, JsonFileStore};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Log every settings change; this is where dependent surfaces (such as a
/// context menu built from the instruction list) get rebuilt.
fn spawn_change_listener(store: &Arc<dyn ConfigStore>) {
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => info!(keys = ?change.keys, "settings changed"),
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "settings change listener fell behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = configuration::Settings::new()?;
    let addr = settings.server.socket_addr()?;

    let store_path = settings.store.path();
    info!("settings stored at {}", store_path.display());
    let store: Arc<dyn ConfigStore> = Arc::new(JsonFileStore::new(store_path));
    spawn_change_listener(&store);

    let request_timeout = settings.coordinator.request_timeout();
    let opener = opener::BrowserSettingsOpener::new(format!("http://{}/settings/providers", addr));
    let coordinator = Coordinator::with_debounce(
        Arc::new(StoreResolver::with_timeout(store.clone(), request_timeout)),
        Arc::new(opener),
        settings.coordinator.debounce(),
    );

    let state = state::AppState {
        coordinator: coordinator.clone(),
        store,
        request_timeout,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    coordinator.shutdown();
    info!("server stopped");
    Ok(())
}
