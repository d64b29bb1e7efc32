pub mod app_config;
pub mod database;
pub mod pg_repo;
pub mod memory_repo;

use std::sync::Arc;

use pedidos_core::Store;

pub use database::DbClient;
pub use memory_repo::MemoryStore;
pub use pg_repo::PgStore;

/// `database.url` prefix that selects the in-process store.
pub const MEMORY_URL_SCHEME: &str = "memory://";

/// Builds the store named by the configuration, running migrations when it
/// is Postgres.
pub async fn connect(config: &app_config::DatabaseConfig) -> Result<Arc<dyn Store>, sqlx::Error> {
    if config.is_memory() {
        tracing::warn!("Using the in-memory store; data is lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db = DbClient::new(config).await?;
    db.migrate().await?;
    Ok(Arc::new(PgStore::from(&db)))
}
