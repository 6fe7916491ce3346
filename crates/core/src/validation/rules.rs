//! Validation rule and result types, plus the listing rule table.

use std::sync::LazyLock;

use chrono::{Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::listing::{has_items, non_blank, FillerRole, ListingDraft};
use crate::listing_wizard::ListingStep;
use crate::session::Session;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ().\-]{7,20}$").expect("valid regex"));

/// Minimum description length before the profile step counts as done.
pub const MIN_DESCRIPTION_CHARS: usize = 50;

/// Oldest birth year accepted for a horse.
pub const MIN_BIRTH_YEAR: i32 = 1980;

/// Pass/fail check for one rule.
pub type RulePredicate = fn(&ListingDraft, &Session) -> bool;

/// A static, field-scoped validation rule.
#[derive(Clone)]
pub struct ValidationRule {
    /// UI field key the rule reports against.
    pub field: &'static str,
    /// Owning wizard step (1-based).
    pub step: u8,
    pub label: &'static str,
    /// Required rules produce errors, optional ones warnings.
    pub required: bool,
    pub check: RulePredicate,
    pub message: &'static str,
    pub help_text: Option<&'static str>,
}

impl std::fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationRule")
            .field("field", &self.field)
            .field("step", &self.step)
            .field("label", &self.label)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

/// A single failing rule, as shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub step_id: u8,
    pub step_title: String,
    pub label: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    pub required: bool,
}

/// Aggregated result of evaluating one step's rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepValidation {
    pub step_id: u8,
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<FieldError>,
    pub completion_percentage: u8,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn is_email(value: Option<&str>) -> bool {
    value.map_or(false, |v| EMAIL_RE.is_match(v))
}

fn is_phone(value: Option<&str>) -> bool {
    value.map_or(false, |v| PHONE_RE.is_match(v))
}

/// Owners may fall back to their profile details; agents must fill them in.
fn owner_fallback<'a>(
    draft: &ListingDraft,
    value: Option<&'a str>,
    profile: Option<&'a str>,
) -> Option<&'a str> {
    match (value, draft.filler_role) {
        (Some(v), _) => Some(v),
        (None, Some(FillerRole::Owner)) => profile,
        _ => None,
    }
}

fn contact_name_ok(draft: &ListingDraft, session: &Session) -> bool {
    owner_fallback(draft, draft.contact_name(), session.profile_name()).is_some()
}

fn contact_email_ok(draft: &ListingDraft, session: &Session) -> bool {
    is_email(owner_fallback(draft, draft.contact_email(), session.profile_email()))
}

fn contact_phone_ok(draft: &ListingDraft, session: &Session) -> bool {
    is_phone(owner_fallback(draft, draft.contact_phone(), session.profile_phone()))
}

fn birth_year_ok(draft: &ListingDraft, _: &Session) -> bool {
    let current_year = Utc::now().year();
    draft
        .year_of_birth
        .map_or(false, |y| (MIN_BIRTH_YEAR..=current_year).contains(&y))
}

fn height_ok(draft: &ListingDraft, _: &Session) -> bool {
    draft
        .height_hands
        .map_or(false, |h| (10.0..=20.0).contains(&h))
}

fn description_ok(draft: &ListingDraft, _: &Session) -> bool {
    non_blank(&draft.description).map_or(false, |d| d.chars().count() >= MIN_DESCRIPTION_CHARS)
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

fn rule(
    step: ListingStep,
    field: &'static str,
    label: &'static str,
    required: bool,
    check: RulePredicate,
    message: &'static str,
    help_text: Option<&'static str>,
) -> ValidationRule {
    ValidationRule {
        field,
        step: step.to_number(),
        label,
        required,
        check,
        message,
        help_text,
    }
}

/// The rule table for the listing wizard.
#[rustfmt::skip]
pub fn listing_rules() -> Vec<ValidationRule> {
    use ListingStep::*;

    vec![
        // -- Role --
        rule(Role, "fillerRole", "Your role", true,
            |d, _| d.filler_role.is_some(),
            "Tell us whether you own the horse or represent the owner",
            None),

        // -- Contact --
        rule(Contact, "ownershipType", "Ownership type", true,
            |d, _| d.ownership_type.is_some(),
            "Select how the horse is owned",
            None),
        rule(Contact, "contactName", "Contact name", true,
            contact_name_ok,
            "Enter a contact name",
            Some("Owners can leave this blank to use the name on their profile")),
        rule(Contact, "contactEmail", "Contact email", true,
            contact_email_ok,
            "Enter a valid contact email",
            Some("Buyers reply to this address")),
        rule(Contact, "contactPhone", "Contact phone", false,
            contact_phone_ok,
            "Add a phone number so buyers can call",
            None),
        rule(Contact, "contactVisibility", "Contact visibility", true,
            |d, _| d.contact_visibility.is_some(),
            "Choose who can see your contact details",
            None),

        // -- Listing type --
        rule(ListingType, "listingType", "Listing type", true,
            |d, _| d.listing_type.is_some(),
            "Pick a listing type",
            None),

        // -- Horse basics --
        rule(HorseBasics, "horseName", "Horse name", true,
            |d, _| non_blank(&d.horse_name).is_some(),
            "Enter the horse's name",
            Some("Barn name is fine")),
        rule(HorseBasics, "sex", "Sex", true,
            |d, _| d.sex.is_some(),
            "Select the horse's sex",
            None),
        rule(HorseBasics, "age", "Age", true,
            birth_year_ok,
            "Enter a valid year of birth",
            Some("Used to compute the horse's age")),
        rule(HorseBasics, "breed", "Breed", true,
            |d, _| non_blank(&d.breed).is_some(),
            "Enter the breed",
            None),
        rule(HorseBasics, "location", "Location", true,
            |d, _| non_blank(&d.current_location).is_some(),
            "Enter where the horse is located",
            Some("City and state is enough")),

        // -- Details --
        rule(Details, "color", "Color", false,
            |d, _| non_blank(&d.color).is_some(),
            "Add the horse's color",
            None),
        rule(Details, "heightHands", "Height", false,
            height_ok,
            "Add a height between 10 and 20 hands",
            None),
        rule(Details, "temperament", "Temperament", false,
            |d, _| non_blank(&d.temperament).is_some(),
            "Describe the horse's temperament",
            None),

        // -- Sale terms --
        rule(SaleTerms, "price", "Price", true,
            |d, _| d.price.map_or(false, |p| p > 0),
            "Enter an asking price",
            None),
        rule(SaleTerms, "saleType", "Sale type", true,
            |d, _| d.sale_type.is_some(),
            "Select sale, lease, or both",
            None),
        rule(SaleTerms, "priceNegotiable", "Negotiable", false,
            |d, _| d.price_negotiable.is_some(),
            "Say whether the price is negotiable",
            None),
        rule(SaleTerms, "trialAvailable", "Trial", false,
            |d, _| d.trial_available.is_some(),
            "Say whether a trial is possible",
            None),

        // -- Profile --
        rule(Profile, "description", "Description", true,
            description_ok,
            "Write a description of at least 50 characters",
            Some("The interview assistant can draft one for you")),
        rule(Profile, "disciplines", "Disciplines", true,
            |d, _| has_items(&d.disciplines),
            "Select at least one discipline",
            None),
        rule(Profile, "experienceLevel", "Rider level", false,
            |d, _| has_items(&d.experience_level),
            "Select the rider levels this horse suits",
            None),
        rule(Profile, "pros", "Pros", false,
            |d, _| non_blank(&d.pros).is_some(),
            "List the horse's strengths",
            None),
        rule(Profile, "cons", "Cons", false,
            |d, _| non_blank(&d.cons).is_some(),
            "Honest cons build buyer trust",
            None),

        // -- Media --
        rule(Media, "images", "Photos", true,
            |d, _| has_items(&d.images),
            "Upload at least one photo",
            Some("Listings with several photos get more inquiries")),
        rule(Media, "videos", "Videos", false,
            |d, _| has_items(&d.videos),
            "Add a video link",
            None),

        // -- Documentation --
        rule(Documentation, "registries", "Registries", false,
            |d, _| has_items(&d.registries),
            "Add breed registries",
            None),
        rule(Documentation, "microchipNumber", "Microchip", false,
            |d, _| non_blank(&d.microchip_number).is_some(),
            "Add the microchip number",
            None),
        rule(Documentation, "medicalNotes", "Medical records", false,
            |d, _| non_blank(&d.medical_notes).is_some(),
            "Summarize vet records",
            None),
    ]
}
