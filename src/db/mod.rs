pub mod connection;
pub mod memory;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::*;
pub use memory::MemoryStorage;
pub use models::*;
pub use repository::PgStorage;

use std::sync::Arc;

use crate::config::{AppConfig, StorageBackend};
use crate::storage::{Storage, StorageResult};

/// Builds the configured backend. Postgres is migrated before it is returned.
pub fn open_storage(settings: &AppConfig) -> StorageResult<Arc<dyn Storage>> {
    match settings.storage {
        StorageBackend::Postgres => {
            let pool = init_pool(&settings.database)?;
            run_migrations(&pool)?;
            Ok(Arc::new(PgStorage::new(pool)))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, data is lost on exit");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
