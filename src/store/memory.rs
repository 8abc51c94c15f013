use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{BookmarkStore, StoreError};
use crate::{
    bookmark::{Bookmark, NewBookmark},
    feed::{ChangeEvent, ChangeHub},
};

/// In-process store that publishes its own change events, standing in for the
/// database trigger. Used for local development and the test suite.
#[derive(Debug)]
pub struct MemoryBookmarkStore {
    rows: Mutex<Vec<Bookmark>>,
    hub: ChangeHub,
}

impl MemoryBookmarkStore {
    pub fn new(hub: ChangeHub) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            hub,
        }
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, Vec<Bookmark>> {
        // A poisoned lock still holds consistent rows, every mutation is a single push or remove.
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BookmarkStore for MemoryBookmarkStore {
    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<Bookmark>, StoreError> {
        let mut bookmarks: Vec<Bookmark> = self
            .rows()
            .iter()
            .rev()
            .filter(|bookmark| bookmark.user_id == owner_id)
            .cloned()
            .collect();
        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = limit {
            bookmarks.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(bookmarks)
    }

    async fn count_for_owner(&self, owner_id: Uuid) -> Result<i64, StoreError> {
        let count = self
            .rows()
            .iter()
            .filter(|bookmark| bookmark.user_id == owner_id)
            .count();
        Ok(count as i64)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Bookmark>, StoreError> {
        Ok(self.rows().iter().find(|bookmark| bookmark.id == id).cloned())
    }

    async fn insert(&self, bookmark: NewBookmark) -> Result<Bookmark, StoreError> {
        let bookmark = bookmark.into_bookmark(Utc::now());
        {
            let mut rows = self.rows();
            rows.push(bookmark.clone());
            // Publishing under the lock keeps events in commit order.
            self.hub.publish(ChangeEvent::Insert {
                new: bookmark.clone(),
            });
        }
        Ok(bookmark)
    }

    async fn delete_owned(&self, id: Uuid, owner_id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows();
        let Some(position) = rows
            .iter()
            .position(|bookmark| bookmark.id == id && bookmark.user_id == owner_id)
        else {
            return Ok(false);
        };

        let old = rows.remove(position);
        self.hub.publish(ChangeEvent::Delete { old });
        Ok(true)
    }
}
