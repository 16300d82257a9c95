//! langdrill-store: Attempt and progress persistence.
//!
//! Two [`ProgressStore`] implementations: an in-process map for tests and
//! throwaway runs, and SQLite through sqlx for everything else.

pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use langdrill_core::error::StoreError;
use langdrill_core::traits::ProgressStore;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// URL that selects [`MemoryStore`] instead of a database.
pub const MEMORY_URL: &str = "memory://";

/// Open the store named by `url`.
///
/// `memory://` gives a [`MemoryStore`]; anything else is handed to sqlx.
pub async fn open(url: &str) -> Result<Arc<dyn ProgressStore>, StoreError> {
    if url == MEMORY_URL {
        tracing::info!("using in-memory progress store");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = SqliteStore::connect(url).await?;
    Ok(Arc::new(store))
}
