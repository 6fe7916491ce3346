//! Horse profile generation collaborator.
//!
//! The profile step can send the seller's interview answers to a
//! text-generation service which drafts the descriptive fields. The service
//! is reached through [`ProfileGenerator`]; its output is untrusted and is
//! validated and filtered here before it touches a draft.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::field_mapper::{filter_allowed, ALLOWED_DISCIPLINES, ALLOWED_EXPERIENCE_LEVELS};
use crate::listing::{non_blank, ListingDraft};

/// Upper bound on generated key strengths kept on a draft.
pub const MAX_KEY_STRENGTHS: usize = 8;

/// One interview question with the seller's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewAnswer {
    pub question: String,
    pub answer: String,
}

/// Payload sent to the generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub horse_name: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub year_of_birth: Option<i32>,
    pub answers: Vec<InterviewAnswer>,
}

impl ProfileRequest {
    /// Build a request from the basics already on the draft.
    pub fn from_draft(draft: &ListingDraft, answers: Vec<InterviewAnswer>) -> Self {
        Self {
            horse_name: non_blank(&draft.horse_name).map(str::to_string),
            breed: non_blank(&draft.breed).map(str::to_string),
            sex: draft.sex.map(|s| s.as_str().to_string()),
            year_of_birth: draft.year_of_birth,
            answers,
        }
    }
}

/// Profile fields drafted by the generation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratedProfile {
    #[validate(length(max = 2000))]
    pub pros: Option<String>,
    #[validate(length(max = 2000))]
    pub cons: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 1000))]
    pub best_for: Option<String>,
    #[validate(length(max = 160))]
    pub tagline: Option<String>,
    #[validate(length(max = 20))]
    pub disciplines: Vec<String>,
    #[validate(length(max = 10))]
    pub experience_level: Vec<String>,
    #[validate(length(max = 20))]
    pub key_strengths: Vec<String>,
}

impl GeneratedProfile {
    /// Validate and clean the generated fields into a draft patch.
    ///
    /// Text is trimmed and blank values dropped; disciplines and experience
    /// levels are filtered against the listing allow-lists.
    pub fn into_patch(self) -> Result<ListingDraft, CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(format!("Generated profile rejected: {e}")))?;

        let key_strengths: Vec<String> = self
            .key_strengths
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .take(MAX_KEY_STRENGTHS)
            .map(str::to_string)
            .collect();

        Ok(ListingDraft {
            pros: trimmed(self.pros),
            cons: trimmed(self.cons),
            description: trimmed(self.description),
            best_for: trimmed(self.best_for),
            tagline: trimmed(self.tagline),
            disciplines: filter_allowed(Some(self.disciplines.as_slice()), ALLOWED_DISCIPLINES),
            experience_level: filter_allowed(
                Some(self.experience_level.as_slice()),
                ALLOWED_EXPERIENCE_LEVELS,
            ),
            key_strengths: (!key_strengths.is_empty()).then_some(key_strengths),
            ..Default::default()
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    non_blank(&value).map(str::to_string)
}

/// Failure reported by a profile generator.
#[derive(Debug, thiserror::Error)]
pub enum ProfileGenError {
    #[error("profile service request failed: {0}")]
    Request(String),

    #[error("profile service returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("profile service returned an unreadable response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ProfileGenerator: Send + Sync {
    async fn generate(&self, request: &ProfileRequest) -> Result<GeneratedProfile, ProfileGenError>;
}
