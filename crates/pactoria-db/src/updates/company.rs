//! Company update builder.

use serde::{Deserialize, Serialize};

use pactoria_core::entities::Address;
use pactoria_core::enums::{CompanySize, SubscriptionTier};
use pactoria_core::errors::CoreError;
use pactoria_core::validation::{self, MAX_NAME_LEN};

use super::double_option;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub vat_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<Address>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub industry: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<CompanySize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<SubscriptionTier>,
}

impl CompanyUpdate {
    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            name: self
                .name
                .map(|n| validation::required_text("company_name", &n, MAX_NAME_LEN))
                .transpose()?,
            registration_number: self
                .registration_number
                .map(|n| {
                    n.filter(|s| !s.trim().is_empty())
                        .map(|s| validation::company_number(&s))
                        .transpose()
                })
                .transpose()?,
            vat_number: self
                .vat_number
                .map(|n| {
                    n.filter(|s| !s.trim().is_empty())
                        .map(|s| validation::uk_vat_number(&s))
                        .transpose()
                })
                .transpose()?,
            address: self
                .address
                .map(|a| a.map(Address::validate).transpose())
                .transpose()?,
            industry: self
                .industry
                .map(|i| validation::optional_text("industry", i.as_deref(), 100))
                .transpose()?,
            size: self.size,
            subscription_tier: self.subscription_tier,
        })
    }
}

pub struct CompanyUpdateBuilder(CompanyUpdate);

impl Default for CompanyUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompanyUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(CompanyUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn registration_number(mut self, number: Option<String>) -> Self {
        self.0.registration_number = Some(number);
        self
    }

    #[must_use]
    pub fn vat_number(mut self, number: Option<String>) -> Self {
        self.0.vat_number = Some(number);
        self
    }

    #[must_use]
    pub fn address(mut self, address: Option<Address>) -> Self {
        self.0.address = Some(address);
        self
    }

    #[must_use]
    pub fn industry(mut self, industry: Option<String>) -> Self {
        self.0.industry = Some(industry);
        self
    }

    #[must_use]
    pub const fn size(mut self, size: CompanySize) -> Self {
        self.0.size = Some(size);
        self
    }

    #[must_use]
    pub const fn subscription_tier(mut self, tier: SubscriptionTier) -> Self {
        self.0.subscription_tier = Some(tier);
        self
    }

    #[must_use]
    pub fn build(self) -> CompanyUpdate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_vat_clears_and_bad_vat_fails() {
        let update = CompanyUpdateBuilder::new()
            .vat_number(Some("  ".into()))
            .build()
            .validate()
            .unwrap();
        assert_eq!(update.vat_number, Some(None));

        assert!(
            CompanyUpdateBuilder::new()
                .vat_number(Some("FR123".into()))
                .build()
                .validate()
                .is_err()
        );
    }
}
