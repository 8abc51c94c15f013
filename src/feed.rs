mod listener;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::bookmark::Bookmark;

pub use listener::{spawn_change_listener, CHANGE_CHANNEL};

/// A row-level change to the bookmarks table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert { new: Bookmark },
    Update { new: Bookmark, old: Bookmark },
    Delete { old: Bookmark },
}

impl ChangeEvent {
    pub fn owner_id(&self) -> Uuid {
        match self {
            Self::Insert { new } | Self::Update { new, .. } => new.user_id,
            Self::Delete { old } => old.user_id,
        }
    }

    pub fn bookmark_id(&self) -> Uuid {
        match self {
            Self::Insert { new } | Self::Update { new, .. } => new.id,
            Self::Delete { old } => old.id,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("subscriber fell behind and missed {0} events")]
    Lagged(u64),
    #[error("change feed closed")]
    Closed,
}

/// Fans change events out to every live subscription.
#[derive(Debug, Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self, owner_id: Uuid) -> Subscription {
        Subscription {
            owner_id,
            receiver: self.sender.subscribe(),
        }
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error, the event is simply dropped.
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Change events for a single owner. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    owner_id: Uuid,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Result<ChangeEvent, FeedError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.owner_id() == self.owner_id => return Ok(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(missed)) => return Err(FeedError::Lagged(missed)),
                Err(RecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }
}
