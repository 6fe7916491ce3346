//! Horse listing draft model.
//!
//! [`ListingDraft`] is the canonical in-memory payload edited by the listing
//! wizard. Every field is optional: a draft may be saved at any point of the
//! flow. [`ListingRow`] is the flat shape stored by the persistence layer;
//! translation between the two lives in [`crate::field_mapper`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// String-backed enums
// ---------------------------------------------------------------------------

/// Declares an enum stored as a snake_case string column.
///
/// Generates `as_str`, `from_str_db` and a `VALUES` list used in error
/// messages.
macro_rules! db_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All valid database values.
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            /// Parse a value read from the database.
            pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(CoreError::Validation(format!(
                        "Invalid {} '{s}'. Must be one of: {}",
                        stringify!($name),
                        Self::VALUES.join(", ")
                    ))),
                }
            }

            /// Convert to a database-compatible string.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value),+
                }
            }
        }
    };
}

db_enum! {
    /// Persistence status of a listing.
    ListingStatus {
        Draft => "draft",
        Published => "published",
    }
}

impl Default for ListingStatus {
    fn default() -> Self {
        Self::Draft
    }
}

db_enum! {
    Sex {
        Mare => "mare",
        Gelding => "gelding",
        Stallion => "stallion",
    }
}

db_enum! {
    /// Whether the horse is offered for sale, lease, or either.
    SaleType {
        Sale => "sale",
        Lease => "lease",
        SaleOrLease => "sale_or_lease",
    }
}

db_enum! {
    /// Who is filling out the listing form.
    FillerRole {
        Owner => "owner",
        Agent => "agent",
    }
}

db_enum! {
    OwnershipType {
        Individual => "individual",
        Business => "business",
        Partnership => "partnership",
    }
}

db_enum! {
    /// Who may see the seller's contact details.
    ContactVisibility {
        Public => "public",
        MembersOnly => "members_only",
        Hidden => "hidden",
    }
}

db_enum! {
    /// Listing plan picked in the listing-type step.
    ListingType {
        Standard => "standard",
        Featured => "featured",
        Premium => "premium",
    }
}

impl FillerRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Owner => "Owner",
            Self::Agent => "Agent",
        }
    }
}

impl OwnershipType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::Business => "Business",
            Self::Partnership => "Partnership",
        }
    }
}

// ---------------------------------------------------------------------------
// ListingDraft
// ---------------------------------------------------------------------------

/// In-progress listing payload, canonical field names only.
///
/// Serializes with camelCase keys, which is the shape step components
/// exchange. Legacy key aliases are resolved by the field mapper.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListingDraft {
    // -- identity --
    pub horse_name: Option<String>,
    pub registered_name: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<Sex>,
    pub color: Option<String>,
    pub year_of_birth: Option<i32>,
    pub height_hands: Option<f64>,
    pub current_location: Option<String>,

    // -- sale terms --
    pub price: Option<i64>,
    pub price_negotiable: Option<bool>,
    pub sale_type: Option<SaleType>,
    pub trial_available: Option<bool>,
    pub xrays_available: Option<bool>,

    // -- descriptive content --
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub description: Option<String>,
    pub best_for: Option<String>,
    pub temperament: Option<String>,
    pub key_strengths: Option<Vec<String>>,
    pub disciplines: Option<Vec<String>>,
    pub experience_level: Option<Vec<String>>,
    pub tagline: Option<String>,

    // -- media --
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,

    // -- documentation --
    pub registries: Option<Vec<String>>,
    pub registration_number: Option<String>,
    pub microchip_number: Option<String>,
    pub medical_notes: Option<String>,

    // -- role / ownership --
    pub filler_role: Option<FillerRole>,
    pub ownership_type: Option<OwnershipType>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub agent_name: Option<String>,
    pub agent_email: Option<String>,
    pub agent_phone: Option<String>,
    pub agent_business: Option<String>,
    pub contact_visibility: Option<ContactVisibility>,
    pub listing_type: Option<ListingType>,
}

/// Copies every `Some` field of `$src` over `$dst`.
macro_rules! overwrite_present {
    ($dst:ident, $src:ident; $($field:ident),+ $(,)?) => {
        $(
            if $src.$field.is_some() {
                $dst.$field = $src.$field;
            }
        )+
    };
}

impl ListingDraft {
    /// Shallow-merge a patch: fields present in `patch` overwrite, absent
    /// fields are left alone.
    pub fn merge(&mut self, patch: ListingDraft) {
        overwrite_present!(self, patch;
            horse_name, registered_name, breed, sex, color, year_of_birth,
            height_hands, current_location,
            price, price_negotiable, sale_type, trial_available, xrays_available,
            pros, cons, description, best_for, temperament, key_strengths,
            disciplines, experience_level, tagline,
            images, videos,
            registries, registration_number, microchip_number, medical_notes,
            filler_role, ownership_type, owner_name, owner_email, owner_phone,
            agent_name, agent_email, agent_phone, agent_business,
            contact_visibility, listing_type,
        );
    }

    /// `true` when no field is set at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Name of the person to contact, depending on who fills out the form.
    pub fn contact_name(&self) -> Option<&str> {
        match self.filler_role {
            Some(FillerRole::Agent) => non_blank(&self.agent_name),
            _ => non_blank(&self.owner_name),
        }
    }

    /// Contact email, depending on who fills out the form.
    pub fn contact_email(&self) -> Option<&str> {
        match self.filler_role {
            Some(FillerRole::Agent) => non_blank(&self.agent_email),
            _ => non_blank(&self.owner_email),
        }
    }

    /// Contact phone, depending on who fills out the form.
    pub fn contact_phone(&self) -> Option<&str> {
        match self.filler_role {
            Some(FillerRole::Agent) => non_blank(&self.agent_phone),
            _ => non_blank(&self.owner_phone),
        }
    }
}

/// Trimmed non-empty view of an optional string.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `true` when an optional list holds at least one non-blank entry.
pub fn has_items(value: &Option<Vec<String>>) -> bool {
    value
        .as_ref()
        .map_or(false, |items| items.iter().any(|s| !s.trim().is_empty()))
}

// ---------------------------------------------------------------------------
// ListingRow
// ---------------------------------------------------------------------------

/// Flat persistence row for the `horse_listings` table (without `id` and
/// `created_at`, which the store assigns).
///
/// Enum-valued columns are plain strings so a row with an unexpected value
/// still loads; the field mapper drops what it cannot parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingRow {
    pub owner_id: DbId,
    pub listing_status: ListingStatus,
    pub title: Option<String>,

    pub horse_name: Option<String>,
    pub registered_name: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub color: Option<String>,
    pub year_of_birth: Option<i32>,
    pub age: i32,
    pub height_hands: Option<f64>,
    pub location: Option<String>,

    pub price: Option<i64>,
    pub price_negotiable: Option<bool>,
    pub sale_type: Option<String>,
    pub trial_available: Option<bool>,
    pub xrays_available: Option<bool>,

    pub pros: Option<String>,
    pub cons: Option<String>,
    pub description: Option<String>,
    pub best_for: Option<String>,
    pub temperament: Option<String>,
    pub key_strengths: Option<Vec<String>>,
    pub disciplines: Option<Vec<String>>,
    pub experience_level: Option<Vec<String>>,
    pub tagline: Option<String>,

    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,

    pub registries: Option<Vec<String>>,
    pub registration_number: Option<String>,
    pub microchip_number: Option<String>,
    pub medical_notes: Option<String>,

    pub filler_role: Option<String>,
    pub ownership_type: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_phone: Option<String>,
    pub agent_name: Option<String>,
    pub agent_email: Option<String>,
    pub agent_phone: Option<String>,
    pub agent_business: Option<String>,
    pub contact_visibility: Option<String>,
    pub listing_type: Option<String>,

    pub updated_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
