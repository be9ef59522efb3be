use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{CompanySize, SubscriptionTier};
use crate::errors::CoreError;
use crate::validation::{self, MAX_NAME_LEN};

/// Registered office address.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
}

impl Address {
    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            line1: validation::required_text("address.line1", &self.line1, MAX_NAME_LEN)?,
            line2: validation::optional_text("address.line2", self.line2.as_deref(), MAX_NAME_LEN)?,
            city: validation::required_text("address.city", &self.city, 100)?,
            postcode: validation::uk_postcode(&self.postcode)?,
        })
    }
}

/// A UK SME tenant. Every user, contract, and private template belongs to one.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub registration_number: Option<String>,
    pub vat_number: Option<String>,
    pub address: Option<Address>,
    pub industry: Option<String>,
    pub size: CompanySize,
    pub subscription_tier: SubscriptionTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    #[must_use]
    pub const fn max_users(&self) -> u32 {
        self.subscription_tier.max_users()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default = "default_size")]
    pub size: CompanySize,
}

const fn default_size() -> CompanySize {
    CompanySize::Small
}

impl NewCompany {
    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            name: validation::required_text("company_name", &self.name, MAX_NAME_LEN)?,
            registration_number: self
                .registration_number
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(validation::company_number)
                .transpose()?,
            vat_number: self
                .vat_number
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(validation::uk_vat_number)
                .transpose()?,
            address: self.address.map(Address::validate).transpose()?,
            industry: validation::optional_text("industry", self.industry.as_deref(), 100)?,
            size: self.size,
        })
    }
}
