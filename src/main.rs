use std::sync::Arc;

use syncboard::config::Config;
use syncboard::services::persistence::{MemorySnapshotStore, PgSnapshotStore, SnapshotStore};
use syncboard::state::AppState;
use syncboard::{db, routes};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenv {
        debug!(error = %e, "no .env file loaded");
    }

    let config = Config::from_env()?;

    let snapshots: Arc<dyn SnapshotStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections).await?;
            info!(max_connections = config.db_max_connections, "database ready");
            Arc::new(PgSnapshotStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, keeping snapshots in memory");
            Arc::new(MemorySnapshotStore::new())
        }
    };

    let state = AppState::new(snapshots, config.client_channel_capacity);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    info!(port = config.port, "syncboard relay listening");
    axum::serve(listener, app).await?;
    Ok(())
}
