//! [`ListingStore`] backed by PostgreSQL.

use async_trait::async_trait;
use paddock_core::listing::{ListingRow, ListingStatus};
use paddock_core::store::{ListingStore, StoreError, StoredListing};
use paddock_core::types::DbId;

use crate::repositories::ListingRepo;
use crate::DbPool;

/// Postgres implementation of the draft persistence seam.
#[derive(Debug, Clone)]
pub struct PgListingStore {
    pool: DbPool,
}

impl PgListingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Connection-level failures are worth retrying; everything else is a
/// backend rejection.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn find_owned(&self, id: DbId, owner_id: DbId) -> Result<Option<ListingRow>, StoreError> {
        let record = ListingRepo::find_owned(&self.pool, id, owner_id)
            .await
            .map_err(map_sqlx_error)?;
        Ok(record.map(|r| r.data.0))
    }

    async fn insert(&self, row: &ListingRow) -> Result<DbId, StoreError> {
        let id = ListingRepo::insert(&self.pool, row)
            .await
            .map_err(map_sqlx_error)?;
        tracing::debug!(listing_id = id, owner_id = row.owner_id, "Inserted horse listing");
        Ok(id)
    }

    async fn update_owned(
        &self,
        id: DbId,
        owner_id: DbId,
        row: &ListingRow,
    ) -> Result<bool, StoreError> {
        ListingRepo::update_owned(&self.pool, id, owner_id, row)
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_by_owner_and_status(
        &self,
        owner_id: DbId,
        status: ListingStatus,
    ) -> Result<Vec<StoredListing>, StoreError> {
        let records = ListingRepo::list_by_owner_and_status(&self.pool, owner_id, status)
            .await
            .map_err(map_sqlx_error)?;
        Ok(records.into_iter().map(StoredListing::from).collect())
    }

    async fn delete_owned(&self, id: DbId, owner_id: DbId) -> Result<bool, StoreError> {
        ListingRepo::delete_owned(&self.pool, id, owner_id)
            .await
            .map_err(map_sqlx_error)
    }
}
