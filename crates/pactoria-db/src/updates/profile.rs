//! User profile update builder.

use serde::{Deserialize, Serialize};

use pactoria_core::errors::CoreError;
use pactoria_core::validation::{self, MAX_NAME_LEN};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            full_name: self
                .full_name
                .map(|n| validation::required_text("full_name", &n, MAX_NAME_LEN))
                .transpose()?,
            email: self
                .email
                .map(|e| validation::email("email", &e))
                .transpose()?,
        })
    }
}

pub struct ProfileUpdateBuilder(ProfileUpdate);

impl Default for ProfileUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ProfileUpdate::default())
    }

    #[must_use]
    pub fn full_name(mut self, name: impl Into<String>) -> Self {
        self.0.full_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.0.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ProfileUpdate {
        self.0
    }
}
