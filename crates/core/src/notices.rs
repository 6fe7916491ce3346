//! User-facing save notices backed by a `tokio::sync::broadcast` channel.
//!
//! The UI subscribes to [`DraftNotices`] to show toasts; the draft manager
//! publishes into it. Publishing with no subscriber is a no-op.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::DbId;

/// A notice the UI may surface to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftNotice {
    /// The draft was persisted (only when feedback was requested).
    Saved { draft_id: DbId, created: bool },

    /// Every save attempt failed.
    SaveFailed { attempts: u32, message: String },

    /// The draft the user was editing could not be loaded.
    LoadFailed { draft_id: DbId, message: String },
}

const DEFAULT_CAPACITY: usize = 64;

/// Fan-out channel for [`DraftNotice`]s.
pub struct DraftNotices {
    sender: broadcast::Sender<DraftNotice>,
}

impl DraftNotices {
    /// Slow receivers past `capacity` observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, notice: DraftNotice) {
        // A send error only means nobody is listening.
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftNotice> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for DraftNotices {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
