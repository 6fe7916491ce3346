//! Horse listing entity model.

use paddock_core::listing::ListingRow;
use paddock_core::store::StoredListing;
use paddock_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `horse_listings` table.
///
/// The data columns are read as one `to_jsonb` document and decoded into
/// the shared [`ListingRow`] shape.
#[derive(Debug, Clone, FromRow)]
pub struct ListingRecord {
    pub id: DbId,
    pub created_at: Timestamp,
    pub data: Json<ListingRow>,
}

impl From<ListingRecord> for StoredListing {
    fn from(record: ListingRecord) -> Self {
        Self {
            id: record.id,
            created_at: Some(record.created_at),
            row: record.data.0,
        }
    }
}

/// Lightweight listing projection for owner dashboards and reports.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ListingSummary {
    pub id: DbId,
    pub owner_id: DbId,
    pub listing_status: String,
    pub title: Option<String>,
    pub horse_name: Option<String>,
    pub updated_at: Timestamp,
}
