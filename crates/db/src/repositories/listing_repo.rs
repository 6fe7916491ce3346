//! Repository for the `horse_listings` table.
//!
//! Writes go through `jsonb_populate_record` so the serialized
//! [`ListingRow`] is the single description of the data columns; reads
//! return the same shape via `to_jsonb`.

use paddock_core::listing::{ListingRow, ListingStatus};
use paddock_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::listing::{ListingRecord, ListingSummary};

/// Data columns written on insert and update (everything but identity,
/// ownership and timestamps).
const DATA_COLUMNS: &str = "listing_status, title, \
     horse_name, registered_name, breed, sex, color, year_of_birth, age, height_hands, location, \
     price, price_negotiable, sale_type, trial_available, xrays_available, \
     pros, cons, description, best_for, temperament, key_strengths, disciplines, \
     experience_level, tagline, \
     images, videos, \
     registries, registration_number, microchip_number, medical_notes, \
     filler_role, ownership_type, owner_name, owner_email, owner_phone, \
     agent_name, agent_email, agent_phone, agent_business, contact_visibility, listing_type";

/// Column list for full-record queries.
const RECORD_COLUMNS: &str = "l.id, l.created_at, to_jsonb(l) AS data";

/// Column list for summary queries.
const SUMMARY_COLUMNS: &str = "id, owner_id, listing_status, title, horse_name, updated_at";

/// Provides owner-scoped CRUD operations for horse listings.
pub struct ListingRepo;

impl ListingRepo {
    /// Insert a new listing and return its id.
    pub async fn insert(pool: &PgPool, row: &ListingRow) -> Result<DbId, sqlx::Error> {
        let query = format!(
            "INSERT INTO horse_listings (owner_id, {DATA_COLUMNS}, updated_at) \
             SELECT owner_id, {DATA_COLUMNS}, COALESCE(updated_at, NOW()) \
             FROM jsonb_populate_record(NULL::horse_listings, $1::jsonb) \
             RETURNING id"
        );
        let (id,): (DbId,) = sqlx::query_as(&query)
            .bind(Json(row))
            .fetch_one(pool)
            .await?;
        Ok(id)
    }

    /// Find a listing by id, only if owned by `owner_id`.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<ListingRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM horse_listings l \
             WHERE l.id = $1 AND l.owner_id = $2"
        );
        sqlx::query_as::<_, ListingRecord>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the data columns of a listing owned by `owner_id`.
    ///
    /// Returns `true` if a row was updated.
    pub async fn update_owned(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        row: &ListingRow,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE horse_listings SET ({DATA_COLUMNS}, updated_at) = \
             (SELECT {DATA_COLUMNS}, COALESCE(updated_at, NOW()) \
              FROM jsonb_populate_record(NULL::horse_listings, $3::jsonb)) \
             WHERE id = $1 AND owner_id = $2"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(owner_id)
            .bind(Json(row))
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List an owner's listings with the given status, most recently
    /// updated first.
    pub async fn list_by_owner_and_status(
        pool: &PgPool,
        owner_id: DbId,
        status: ListingStatus,
    ) -> Result<Vec<ListingRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM horse_listings l \
             WHERE l.owner_id = $1 AND l.listing_status = $2 \
             ORDER BY l.updated_at DESC, l.id DESC"
        );
        sqlx::query_as::<_, ListingRecord>(&query)
            .bind(owner_id)
            .bind(status.as_str())
            .fetch_all(pool)
            .await
    }

    /// List summaries of every listing owned by `owner_id`.
    pub async fn list_summaries(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<ListingSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM horse_listings \
             WHERE owner_id = $1 \
             ORDER BY updated_at DESC, id DESC"
        );
        sqlx::query_as::<_, ListingSummary>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a listing owned by `owner_id`. Returns `true` if a row was
    /// removed.
    pub async fn delete_owned(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM horse_listings WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
