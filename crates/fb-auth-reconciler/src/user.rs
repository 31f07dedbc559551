//! The provider user stored in the firewall session.

use crate::{BridgeResult, ProfileFields};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

type SessionTuple = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<NaiveDate>,
);

/// A user authenticated through the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub provider_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
}

impl SessionUser {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            ..Default::default()
        }
    }

    pub fn from_profile(provider_id: impl Into<String>, profile: &ProfileFields) -> Self {
        Self {
            provider_id: provider_id.into(),
            email: profile.email.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            gender: profile.gender.clone(),
            birthday: profile.birthday,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_birthday(mut self, birthday: Option<NaiveDate>) -> Self {
        self.birthday = birthday;
        self
    }

    /// "First Last", falling back to whichever part is set.
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(name), None) | (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }

    /// Positional session form:
    /// `[provider_id, email, first_name, last_name, gender, birthday]`.
    pub fn to_session_string(&self) -> BridgeResult<String> {
        let tuple: SessionTuple = (
            self.provider_id.clone(),
            self.email.clone(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.gender.clone(),
            self.birthday,
        );
        Ok(serde_json::to_string(&tuple)?)
    }

    pub fn from_session_str(raw: &str) -> BridgeResult<Self> {
        let (provider_id, email, first_name, last_name, gender, birthday): SessionTuple =
            serde_json::from_str(raw)?;
        Ok(Self {
            provider_id,
            email,
            first_name,
            last_name,
            gender,
            birthday,
        })
    }
}
