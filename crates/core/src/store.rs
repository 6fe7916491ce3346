//! Persistence seam for listing drafts.
//!
//! The draft manager talks to storage only through [`ListingStore`]; the
//! Postgres implementation lives in `paddock-db`. Every operation is scoped
//! to an owner so a caller can never read or write another user's row.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::listing::{ListingRow, ListingStatus};
use crate::types::{DbId, Timestamp};

/// Failure reported by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend rejected the operation (constraint, bad data, ...).
    #[error("store backend error: {0}")]
    Backend(String),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A persisted row together with its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredListing {
    pub id: DbId,
    pub created_at: Option<Timestamp>,
    pub row: ListingRow,
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Fetch a row by id, only when owned by `owner_id`.
    async fn find_owned(&self, id: DbId, owner_id: DbId) -> Result<Option<ListingRow>, StoreError>;

    /// Insert a new row and return its id.
    async fn insert(&self, row: &ListingRow) -> Result<DbId, StoreError>;

    /// Replace the row `id` owned by `owner_id`. Returns `false` when no row
    /// matched.
    async fn update_owned(
        &self,
        id: DbId,
        owner_id: DbId,
        row: &ListingRow,
    ) -> Result<bool, StoreError>;

    /// Rows owned by `owner_id` with `status`, most recently updated first.
    async fn list_by_owner_and_status(
        &self,
        owner_id: DbId,
        status: ListingStatus,
    ) -> Result<Vec<StoredListing>, StoreError>;

    /// Delete the row `id` owned by `owner_id`. Returns `false` when no row
    /// matched.
    async fn delete_owned(&self, id: DbId, owner_id: DbId) -> Result<bool, StoreError>;
}
