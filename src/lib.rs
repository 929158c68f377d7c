pub mod adapters;
mod app;
pub mod config;
pub mod error;
pub mod ports;
pub mod push;
pub mod state;
pub mod store;
pub mod types;

pub use app::app;
pub use error::{Error, Result};
pub use push::PushDispatcher;
pub use push::vapid::{VapidCredentials, generate_vapid_credentials};
pub use store::NotificationStore;

pub async fn serve(config: config::AppConfig) -> Result<()> {
    let store = NotificationStore::open(&config.database_path)?;
    let addr = config.listen;
    let state = state::AppState::from_config(config, store);
    if !state.dispatcher.is_configured() {
        tracing::warn!("VAPID keys missing; push delivery will be rejected");
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
