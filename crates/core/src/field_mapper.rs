//! Translation between the UI draft shape and the persistence row shape.
//!
//! The UI exchanges camelCase JSON, and older step components still read
//! and write a few legacy key names. All alias handling is confined to this
//! module: the rest of the crate only sees canonical [`ListingDraft`]
//! fields.
//!
//! Every function here is pure. Missing or unparseable values map to empty
//! or zero instead of failing, since drafts are incomplete by nature.

use chrono::{Datelike, Utc};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::listing::{
    ContactVisibility, FillerRole, ListingDraft, ListingRow, ListingStatus, ListingType,
    OwnershipType, SaleType, Sex,
};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Disciplines a listing may advertise.
pub const ALLOWED_DISCIPLINES: &[&str] = &[
    "dressage",
    "show_jumping",
    "eventing",
    "hunter",
    "equitation",
    "western_pleasure",
    "reining",
    "trail",
    "endurance",
    "barrel_racing",
    "driving",
    "pleasure",
    "ranch",
    "polo",
];

/// Rider experience levels a listing may target.
pub const ALLOWED_EXPERIENCE_LEVELS: &[&str] =
    &["beginner", "intermediate", "advanced", "professional"];

/// `(canonical, legacy)` UI key pairs that describe the same concept.
pub const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("currentLocation", "location"),
    ("horseName", "barnName"),
    ("yearOfBirth", "birthYear"),
    ("price", "askingPrice"),
    ("videos", "videoLinks"),
];

/// UI keys whose values may arrive as numeric strings from form inputs.
const NUMERIC_KEYS: &[&str] = &["price", "yearOfBirth", "heightHands"];

/// Numeric keys that take whole numbers and may carry thousands separators.
const INTEGER_KEYS: &[&str] = &["price", "yearOfBirth"];

// ---------------------------------------------------------------------------
// Draft -> row
// ---------------------------------------------------------------------------

/// Map a draft to its persistence row, stamped with the current time.
pub fn to_row(draft: &ListingDraft, owner_id: DbId, status: ListingStatus) -> ListingRow {
    to_row_at(draft, owner_id, status, Utc::now())
}

/// Map a draft to its persistence row as of `now`.
///
/// `status` is written verbatim; the mapper never decides a listing's
/// status. `title` is left empty for the caller to fill.
pub fn to_row_at(
    draft: &ListingDraft,
    owner_id: DbId,
    status: ListingStatus,
    now: Timestamp,
) -> ListingRow {
    ListingRow {
        owner_id,
        listing_status: status,
        title: None,

        horse_name: draft.horse_name.clone(),
        registered_name: draft.registered_name.clone(),
        breed: draft.breed.clone(),
        sex: draft.sex.map(|s| s.as_str().to_string()),
        color: draft.color.clone(),
        year_of_birth: draft.year_of_birth,
        age: derive_age(draft.year_of_birth, now.year()),
        height_hands: draft.height_hands,
        location: draft.current_location.clone(),

        price: draft.price,
        price_negotiable: draft.price_negotiable,
        sale_type: draft.sale_type.map(|s| s.as_str().to_string()),
        trial_available: draft.trial_available,
        xrays_available: draft.xrays_available,

        pros: draft.pros.clone(),
        cons: draft.cons.clone(),
        description: draft.description.clone(),
        best_for: draft.best_for.clone(),
        temperament: draft.temperament.clone(),
        key_strengths: draft.key_strengths.clone(),
        disciplines: filter_allowed(draft.disciplines.as_deref(), ALLOWED_DISCIPLINES),
        experience_level: filter_allowed(
            draft.experience_level.as_deref(),
            ALLOWED_EXPERIENCE_LEVELS,
        ),
        tagline: draft.tagline.clone(),

        images: draft.images.clone(),
        videos: draft.videos.clone(),

        registries: draft.registries.clone(),
        registration_number: draft.registration_number.clone(),
        microchip_number: draft.microchip_number.clone(),
        medical_notes: draft.medical_notes.clone(),

        filler_role: draft.filler_role.map(|r| r.as_str().to_string()),
        ownership_type: draft.ownership_type.map(|o| o.as_str().to_string()),
        owner_name: draft.owner_name.clone(),
        owner_email: draft.owner_email.clone(),
        owner_phone: draft.owner_phone.clone(),
        agent_name: draft.agent_name.clone(),
        agent_email: draft.agent_email.clone(),
        agent_phone: draft.agent_phone.clone(),
        agent_business: draft.agent_business.clone(),
        contact_visibility: draft.contact_visibility.map(|v| v.as_str().to_string()),
        listing_type: draft.listing_type.map(|t| t.as_str().to_string()),

        updated_at: Some(now),
    }
}

/// Age in whole years for a birth year, 0 when unknown or in the future.
pub fn derive_age(year_of_birth: Option<i32>, current_year: i32) -> i32 {
    year_of_birth.map_or(0, |year| current_year.saturating_sub(year).max(0))
}

/// Normalize free-form choice labels (`"Show Jumping"` -> `"show_jumping"`).
pub fn normalize_choice(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Keep only allow-listed values, normalized and de-duplicated in order.
///
/// Returns `None` when nothing survives so the column is stored as null.
pub fn filter_allowed(values: Option<&[String]>, allowed: &[&str]) -> Option<Vec<String>> {
    let mut kept: Vec<String> = Vec::new();
    for value in values? {
        let normalized = normalize_choice(value);
        if allowed.contains(&normalized.as_str()) {
            if !kept.contains(&normalized) {
                kept.push(normalized);
            }
        } else if !normalized.is_empty() {
            tracing::debug!(value = %value, "Dropping value outside allow-list");
        }
    }
    if kept.is_empty() {
        None
    } else {
        Some(kept)
    }
}

// ---------------------------------------------------------------------------
// Row -> draft
// ---------------------------------------------------------------------------

/// Map a persistence row back into the canonical draft.
pub fn from_row(row: &ListingRow) -> ListingDraft {
    let current_year = Utc::now().year();
    // Rows written before birth years were collected only carry `age`.
    let year_of_birth = row
        .year_of_birth
        .or_else(|| (row.age > 0).then(|| current_year.saturating_sub(row.age)));

    ListingDraft {
        horse_name: row.horse_name.clone(),
        registered_name: row.registered_name.clone(),
        breed: row.breed.clone(),
        sex: parse_lenient("sex", &row.sex, Sex::from_str_db),
        color: row.color.clone(),
        year_of_birth,
        height_hands: row.height_hands,
        current_location: row.location.clone(),

        price: row.price,
        price_negotiable: row.price_negotiable,
        sale_type: parse_lenient("sale_type", &row.sale_type, SaleType::from_str_db),
        trial_available: row.trial_available,
        xrays_available: row.xrays_available,

        pros: row.pros.clone(),
        cons: row.cons.clone(),
        description: row.description.clone(),
        best_for: row.best_for.clone(),
        temperament: row.temperament.clone(),
        key_strengths: row.key_strengths.clone(),
        disciplines: row.disciplines.clone(),
        experience_level: row.experience_level.clone(),
        tagline: row.tagline.clone(),

        images: row.images.clone(),
        videos: row.videos.clone(),

        registries: row.registries.clone(),
        registration_number: row.registration_number.clone(),
        microchip_number: row.microchip_number.clone(),
        medical_notes: row.medical_notes.clone(),

        filler_role: parse_lenient("filler_role", &row.filler_role, FillerRole::from_str_db),
        ownership_type: parse_lenient(
            "ownership_type",
            &row.ownership_type,
            OwnershipType::from_str_db,
        ),
        owner_name: row.owner_name.clone(),
        owner_email: row.owner_email.clone(),
        owner_phone: row.owner_phone.clone(),
        agent_name: row.agent_name.clone(),
        agent_email: row.agent_email.clone(),
        agent_phone: row.agent_phone.clone(),
        agent_business: row.agent_business.clone(),
        contact_visibility: parse_lenient(
            "contact_visibility",
            &row.contact_visibility,
            ContactVisibility::from_str_db,
        ),
        listing_type: parse_lenient("listing_type", &row.listing_type, ListingType::from_str_db),
    }
}

fn parse_lenient<T>(
    column: &'static str,
    value: &Option<String>,
    parse: fn(&str) -> Result<T, CoreError>,
) -> Option<T> {
    let raw = value.as_deref().filter(|s| !s.is_empty())?;
    match parse(raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(column, error = %e, "Ignoring unparseable column value");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// UI boundary
// ---------------------------------------------------------------------------

/// Render a draft in the UI shape, with every legacy key mirrored from its
/// canonical field so old and new step components read the same data.
pub fn to_ui_value(draft: &ListingDraft) -> Value {
    let mut map = canonical_map(draft);
    for (canonical, legacy) in LEGACY_ALIASES {
        let value = map.get(*canonical).cloned().unwrap_or(Value::Null);
        map.insert((*legacy).to_string(), value);
    }
    Value::Object(map)
}

/// Build a draft from a full UI payload.
pub fn draft_from_ui_value(value: &Value) -> Result<ListingDraft, CoreError> {
    apply_ui_patch(&ListingDraft::default(), value)
}

/// Apply a UI patch (a partial camelCase object) to `draft`.
///
/// Legacy keys are folded into their canonical field; a non-empty
/// canonical value wins over its legacy twin. `null` clears a field and
/// unknown keys are ignored. Each value is type-checked on its own: if any
/// is malformed the whole patch is rejected and `draft` is unaffected.
pub fn apply_ui_patch(draft: &ListingDraft, patch: &Value) -> Result<ListingDraft, CoreError> {
    let obj = patch
        .as_object()
        .ok_or_else(|| CoreError::Validation("Draft patch must be a JSON object".to_string()))?;

    let mut merged = canonical_map(draft);
    let resolved = resolve_aliases(obj);

    let mut invalid: Vec<String> = Vec::new();
    let mut accepted: Vec<(String, Value)> = Vec::new();
    for (key, value) in resolved {
        if !merged.contains_key(&key) {
            tracing::debug!(key = %key, "Ignoring unknown draft key");
            continue;
        }
        let value = coerce_numeric(&key, value);
        let probe = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
        match serde_json::from_value::<ListingDraft>(probe) {
            Ok(_) => accepted.push((key, value)),
            Err(e) => invalid.push(format!("{key} ({e})")),
        }
    }

    if !invalid.is_empty() {
        return Err(CoreError::Validation(format!(
            "Invalid draft values: {}",
            invalid.join(", ")
        )));
    }

    merged.extend(accepted);
    serde_json::from_value(Value::Object(merged))
        .map_err(|e| CoreError::Internal(format!("Draft patch merge failed: {e}")))
}

/// Canonical camelCase map of every draft field (unset fields as `null`).
fn canonical_map(draft: &ListingDraft) -> Map<String, Value> {
    match serde_json::to_value(draft) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Fold legacy keys into canonical ones, dropping the legacy names.
fn resolve_aliases(obj: &Map<String, Value>) -> Map<String, Value> {
    let mut resolved = obj.clone();
    for (canonical, legacy) in LEGACY_ALIASES {
        let Some(legacy_value) = resolved.remove(*legacy) else {
            continue;
        };
        let canonical_present = resolved
            .get(*canonical)
            .map_or(false, |v| !is_empty_value(v));
        if !canonical_present {
            resolved.insert((*canonical).to_string(), legacy_value);
        }
    }
    resolved
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Form inputs deliver numbers as strings; accept those for numeric keys.
fn coerce_numeric(key: &str, value: Value) -> Value {
    if !NUMERIC_KEYS.contains(&key) {
        return value;
    }
    let Value::String(s) = &value else {
        return value;
    };
    let trimmed = if INTEGER_KEYS.contains(&key) {
        s.trim().replace(',', "")
    } else {
        s.trim().to_string()
    };
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) => serde_json::Number::from_f64(f).map_or(value, Value::Number),
        Err(_) => value,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
