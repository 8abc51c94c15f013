mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::bookmark::{Bookmark, NewBookmark};

pub use memory::MemoryBookmarkStore;
pub use postgres::PgBookmarkStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable bookmark state. Every write surfaces as a change event on the hub
/// the store was built with, whether the store publishes it or the database does.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Bookmarks owned by `owner_id`, newest first.
    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Bookmark>, StoreError>;

    async fn count_for_owner(&self, owner_id: Uuid) -> Result<i64, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Bookmark>, StoreError>;

    async fn insert(&self, bookmark: NewBookmark) -> Result<Bookmark, StoreError>;

    /// Deletes `id` only if it is owned by `owner_id`. Returns whether a row was removed.
    async fn delete_owned(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError>;
}
