use crate::configuration::{Settings, StorageKind};
use crate::providers::errors::ProviderError;
use crate::providers::storage::{MemoryStorage, PostgresStorage, StorageProvider};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Builds the storage provider selected by `settings.storage.provider`.
///
/// Postgres pools connect eagerly and apply pending migrations.
pub async fn init(settings: &Settings) -> Result<Arc<dyn StorageProvider>, ProviderError> {
    match settings.storage.provider {
        StorageKind::Postgres => {
            tracing::info!(
                db_host = %settings.database.host,
                db_port = settings.database.port,
                db_name = %settings.database.database_name,
                "Connecting to PostgreSQL"
            );

            let pool = PgPoolOptions::new()
                .max_connections(settings.storage.max_connections)
                .acquire_timeout(Duration::from_secs(settings.storage.acquire_timeout_secs))
                .connect(&settings.database.connection_string())
                .await?;

            let storage = PostgresStorage::new(pool);
            storage.migrate().await?;

            Ok(Arc::new(storage))
        }
        StorageKind::Memory => {
            tracing::warn!("Using in-memory storage - data is lost on restart");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
