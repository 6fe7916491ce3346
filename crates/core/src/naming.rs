//! Placeholder titles for freshly created drafts.
//!
//! A draft gets a human-readable title on its first insert so it can be told
//! apart in the owner's dashboard before the horse profile is finished.

use chrono::NaiveDate;

use crate::listing::{non_blank, ListingDraft};

/// Generate a placeholder listing title from whatever the draft holds.
///
/// Convention with a horse name: `{name} - {breed} - {location}: {tagline}`,
/// skipping absent parts. Without a name: `{Role} listing ({Ownership}) -
/// {date}`, again skipping absent parts.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use paddock_core::listing::ListingDraft;
/// use paddock_core::naming::placeholder_title;
///
/// let today = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
/// let draft = ListingDraft {
///     horse_name: Some("Bo".into()),
///     breed: Some("Warmblood".into()),
///     current_location: Some("Ocala, FL".into()),
///     ..Default::default()
/// };
/// assert_eq!(placeholder_title(&draft, today), "Bo - Warmblood - Ocala, FL");
/// assert_eq!(
///     placeholder_title(&ListingDraft::default(), today),
///     "Draft listing - Oct 14, 2026"
/// );
/// ```
pub fn placeholder_title(draft: &ListingDraft, today: NaiveDate) -> String {
    if let Some(name) = non_blank(&draft.horse_name) {
        let mut title = [Some(name), non_blank(&draft.breed), non_blank(&draft.current_location)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" - ");
        if let Some(tagline) = non_blank(&draft.tagline) {
            title.push_str(": ");
            title.push_str(tagline);
        }
        return title;
    }

    let mut title = match draft.filler_role {
        Some(role) => format!("{} listing", role.label()),
        None => "Draft listing".to_string(),
    };
    if let Some(ownership) = draft.ownership_type {
        title.push_str(&format!(" ({})", ownership.label()));
    }
    title.push_str(" - ");
    title.push_str(&today.format("%b %-d, %Y").to_string());
    title
}
