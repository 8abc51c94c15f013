use std::{str::FromStr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::User,
    bookmark::{Bookmark, NewBookmark},
    error::ApiError,
    startup::ApplicationState,
};

const RECENT_BOOKMARKS: i64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBookmarkRequest {
    pub url: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub bookmark_count: i64,
    pub recent_bookmarks: Vec<Bookmark>,
}

/// GET /api/bookmarks
pub async fn list_bookmarks(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Bookmark>>, ApiError> {
    let bookmarks = state.store.list_for_owner(user.id, None).await?;
    Ok(Json(bookmarks))
}

/// POST /api/bookmarks
pub async fn create_bookmark(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
    body: Result<Json<CreateBookmarkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Bookmark>), ApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(%rejection, "unreadable create bookmark body");
        ApiError::InvalidInput
    })?;

    let new_bookmark =
        NewBookmark::parse(user.id, body.url, body.title).ok_or(ApiError::InvalidInput)?;
    let bookmark = state.store.insert(new_bookmark).await?;

    tracing::info!(bookmark = %bookmark.id, user = %user.id, "bookmark created");
    Ok((StatusCode::CREATED, Json(bookmark)))
}

/// DELETE /api/bookmarks/:bookmark_id
pub async fn delete_bookmark(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
    Path(bookmark_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let bookmark_id = Uuid::from_str(&bookmark_id).map_err(|_| ApiError::NotFound)?;

    let bookmark = state
        .store
        .find(bookmark_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if bookmark.user_id != user.id {
        tracing::warn!(
            ?user,
            bookmark = %bookmark_id,
            "user does not own bookmark"
        );
        return Err(ApiError::Forbidden);
    }

    // A concurrent delete may have removed the row since the lookup.
    if !state.store.delete_owned(bookmark_id, user.id).await? {
        return Err(ApiError::NotFound);
    }

    tracing::info!(bookmark = %bookmark_id, user = %user.id, "bookmark deleted");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let bookmark_count = state.store.count_for_owner(user.id).await?;
    let recent_bookmarks = state
        .store
        .list_for_owner(user.id, Some(RECENT_BOOKMARKS))
        .await?;

    Ok(Json(DashboardResponse {
        bookmark_count,
        recent_bookmarks,
    }))
}

/// GET /api/session
pub async fn current_session(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}
