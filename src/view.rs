//! Client-side view state for the bookmarks page.
//!
//! Views never fetch the current user themselves; they are handed a [`Session`].
//! The list converges on the server state by applying change-feed events, and
//! tolerates the initial fetch arriving before or after those events.

use std::{collections::HashSet, fmt};

use uuid::Uuid;

use crate::{auth::User, bookmark::Bookmark, feed::ChangeEvent, routes::CreateBookmarkRequest};

/// The signed-in user, passed explicitly into every view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
    token: String,
}

impl Session {
    pub fn new(user: User, token: String) -> Self {
        Self { user, token }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Signing out only discards the token; the identity provider owns the session.
    pub fn sign_out(self) -> User {
        self.user
    }
}

#[derive(Debug, Clone)]
pub struct BookmarkList {
    owner_id: Uuid,
    bookmarks: Vec<Bookmark>,
    // Feed events seen since the last fetch was reconciled.
    inserted: HashSet<Uuid>,
    removed: HashSet<Uuid>,
    deleting: Option<Uuid>,
}

impl BookmarkList {
    pub fn new(session: &Session, initial: Vec<Bookmark>) -> Self {
        let mut list = Self {
            owner_id: session.user().id,
            bookmarks: Vec::new(),
            inserted: HashSet::new(),
            removed: HashSet::new(),
            deleting: None,
        };
        list.reconcile_fetched(initial);
        list
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Applies a feed event. Returns false when the event belongs to another owner.
    pub fn apply(&mut self, event: ChangeEvent) -> bool {
        if event.owner_id() != self.owner_id {
            return false;
        }

        match event {
            ChangeEvent::Insert { new } => {
                self.removed.remove(&new.id);
                self.inserted.insert(new.id);
                match self.position(new.id) {
                    Some(index) => self.bookmarks[index] = new,
                    None => self.bookmarks.insert(0, new),
                }
            }
            ChangeEvent::Update { new, .. } => {
                if let Some(index) = self.position(new.id) {
                    self.bookmarks[index] = new;
                }
            }
            ChangeEvent::Delete { old } => {
                self.bookmarks.retain(|bookmark| bookmark.id != old.id);
                self.inserted.remove(&old.id);
                self.removed.insert(old.id);
                if self.deleting == Some(old.id) {
                    self.deleting = None;
                }
            }
        }
        true
    }

    /// Replaces the list with a full fetch of the owner's bookmarks.
    ///
    /// The fetch may be older or newer than the events applied so far: bookmarks
    /// inserted by the feed since the previous fetch survive even when missing from
    /// it, and bookmarks deleted by the feed are not resurrected. Anything else the
    /// fetch does not contain is gone on the server.
    pub fn reconcile_fetched(&mut self, fetched: Vec<Bookmark>) {
        let mut bookmarks: Vec<Bookmark> = fetched
            .into_iter()
            .filter(|bookmark| {
                bookmark.user_id == self.owner_id && !self.removed.contains(&bookmark.id)
            })
            .collect();

        for bookmark in self.bookmarks.drain(..) {
            if self.inserted.contains(&bookmark.id)
                && !bookmarks.iter().any(|fetched| fetched.id == bookmark.id)
            {
                bookmarks.push(bookmark);
            }
        }

        bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.bookmarks = bookmarks;
        self.inserted.clear();
        self.removed.clear();
        if let Some(id) = self.deleting {
            if self.position(id).is_none() {
                self.deleting = None;
            }
        }
    }

    pub fn begin_delete(&mut self, id: Uuid) {
        self.deleting = Some(id);
    }

    /// The delete request failed; the item becomes deletable again.
    pub fn delete_failed(&mut self, id: Uuid) {
        if self.deleting == Some(id) {
            self.deleting = None;
        }
    }

    pub fn is_deleting(&self, id: Uuid) -> bool {
        self.deleting == Some(id)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.bookmarks.iter().position(|bookmark| bookmark.id == id)
    }
}

impl fmt::Display for BookmarkList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bookmarks.is_empty() {
            return writeln!(f, "No bookmarks yet. Add your first bookmark above!");
        }

        let plural = if self.bookmarks.len() == 1 { "" } else { "s" };
        writeln!(f, "Your Bookmarks ({} bookmark{})", self.bookmarks.len(), plural)?;
        for bookmark in &self.bookmarks {
            let action = if self.is_deleting(bookmark.id) {
                "Deleting..."
            } else {
                "Delete"
            };
            writeln!(f, "- {} [{}]", bookmark.title, action)?;
            writeln!(f, "  {}", bookmark.url)?;
            writeln!(
                f,
                "  Added {}",
                bookmark.created_at.format("%Y-%m-%d at %H:%M:%S")
            )?;
        }
        Ok(())
    }
}

/// The "Add New Bookmark" form.
#[derive(Debug, Clone, Default)]
pub struct BookmarkForm {
    pub url: String,
    pub title: String,
    submitting: bool,
}

impl BookmarkForm {
    /// Request to send, or `None` while a submission is in flight or a field is empty.
    pub fn submit(&mut self) -> Option<CreateBookmarkRequest> {
        if self.submitting || self.url.is_empty() || self.title.is_empty() {
            return None;
        }
        self.submitting = true;
        Some(CreateBookmarkRequest {
            url: Some(self.url.clone()),
            title: Some(self.title.clone()),
        })
    }

    /// Ends the submission. Fields are kept on failure so the user can retry.
    pub fn finish(&mut self, succeeded: bool) {
        self.submitting = false;
        if succeeded {
            self.url.clear();
            self.title.clear();
        }
    }
}
