//! Authenticated caller context.
//!
//! A [`Session`] is built once by the host application (from its auth
//! provider) and passed explicitly into the validation engine and the
//! draft manager.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Profile details the user entered during onboarding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// The authenticated user a draft is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: DbId,
    pub profile: Option<Profile>,
}

impl Session {
    /// Session without any profile data.
    pub fn new(user_id: DbId) -> Self {
        Self {
            user_id,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Profile email, when one was entered and is non-blank.
    pub fn profile_email(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.email.as_deref())
            .filter(|e| !e.trim().is_empty())
    }

    /// Profile phone, when one was entered and is non-blank.
    pub fn profile_phone(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.phone.as_deref())
            .filter(|p| !p.trim().is_empty())
    }

    /// Profile full name, when one was entered and is non-blank.
    pub fn profile_name(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.full_name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }
}
