use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated bookmark that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub user_id: Uuid,
    pub url: String,
    pub title: String,
}

impl NewBookmark {
    /// Both fields must be present; the url is not checked beyond that.
    pub fn parse(user_id: Uuid, url: Option<String>, title: Option<String>) -> Option<Self> {
        let url = url.filter(|url| !url.is_empty())?;
        let title = title.filter(|title| !title.is_empty())?;
        Some(Self {
            user_id,
            url,
            title,
        })
    }

    pub fn into_bookmark(self, now: DateTime<Utc>) -> Bookmark {
        Bookmark {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            url: self.url,
            title: self.title,
            created_at: now,
            updated_at: now,
        }
    }
}
