use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BookmarkStore, StoreError};
use crate::bookmark::{Bookmark, NewBookmark};

/// Change events for this store come from the `bookmarks_notify_change` trigger,
/// see [`crate::feed::spawn_change_listener`].
#[derive(Debug, Clone)]
pub struct PgBookmarkStore {
    pool: PgPool,
}

impl PgBookmarkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookmarkStore for PgBookmarkStore {
    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Bookmark>, StoreError> {
        let bookmarks = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, url, title, created_at, updated_at
            FROM bookmarks
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookmarks)
    }

    async fn count_for_owner(&self, owner_id: Uuid) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookmarks WHERE user_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Bookmark>, StoreError> {
        let bookmark = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, url, title, created_at, updated_at
            FROM bookmarks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bookmark)
    }

    async fn insert(&self, bookmark: NewBookmark) -> Result<Bookmark, StoreError> {
        let bookmark = bookmark.into_bookmark(Utc::now());

        let bookmark = sqlx::query_as::<_, Bookmark>(
            r#"
            INSERT INTO bookmarks (id, user_id, url, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, url, title, created_at, updated_at
            "#,
        )
        .bind(bookmark.id)
        .bind(bookmark.user_id)
        .bind(&bookmark.url)
        .bind(&bookmark.title)
        .bind(bookmark.created_at)
        .bind(bookmark.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(bookmark)
    }

    async fn delete_owned(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
