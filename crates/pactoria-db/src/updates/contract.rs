//! Contract update builder.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pactoria_core::entities::DEFAULT_CURRENCY;
use pactoria_core::enums::ContractType;
use pactoria_core::errors::CoreError;
use pactoria_core::validation::{self, MAX_NAME_LEN, MAX_PLAIN_ENGLISH_LEN, MAX_TITLE_LEN};

use super::double_option;

const MAX_CONTENT_LEN: usize = 200_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<ContractType>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub plain_english_input: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub client_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub client_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub contract_value: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub final_content: Option<Option<String>>,
    /// Recorded on the new version when `final_content` changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<String>,
}

fn normalize_optional(
    field: &str,
    value: Option<Option<String>>,
    max_len: usize,
) -> Result<Option<Option<String>>, CoreError> {
    value
        .map(|v| validation::optional_text(field, v.as_deref(), max_len))
        .transpose()
}

impl ContractUpdate {
    /// Field-level validation. Cross-field rules (date order) are checked by
    /// the repository against the merged contract.
    pub fn validate(self) -> Result<Self, CoreError> {
        if let Some(value) = self.contract_value {
            validation::contract_value(value)?;
        }
        Ok(Self {
            title: self
                .title
                .map(|t| validation::required_text("title", &t, MAX_TITLE_LEN))
                .transpose()?,
            contract_type: self.contract_type,
            plain_english_input: normalize_optional(
                "plain_english_input",
                self.plain_english_input,
                MAX_PLAIN_ENGLISH_LEN,
            )?,
            client_name: normalize_optional("client_name", self.client_name, MAX_NAME_LEN)?,
            client_email: self
                .client_email
                .map(|e| {
                    e.filter(|s| !s.trim().is_empty())
                        .map(|s| validation::email("client_email", &s))
                        .transpose()
                })
                .transpose()?,
            supplier_name: normalize_optional("supplier_name", self.supplier_name, MAX_NAME_LEN)?,
            contract_value: self.contract_value,
            currency: self
                .currency
                .map(|c| {
                    if c.trim().is_empty() {
                        Ok(DEFAULT_CURRENCY.to_string())
                    } else {
                        validation::currency(&c)
                    }
                })
                .transpose()?,
            start_date: self.start_date,
            end_date: self.end_date,
            final_content: normalize_optional("final_content", self.final_content, MAX_CONTENT_LEN)?,
            change_summary: validation::optional_text(
                "change_summary",
                self.change_summary.as_deref(),
                500,
            )?,
        })
    }

    /// Whether any column would change (ignoring `change_summary`).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.contract_type.is_none()
            && self.plain_english_input.is_none()
            && self.client_name.is_none()
            && self.client_email.is_none()
            && self.supplier_name.is_none()
            && self.contract_value.is_none()
            && self.currency.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.final_content.is_none()
    }
}

pub struct ContractUpdateBuilder(ContractUpdate);

impl Default for ContractUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ContractUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn contract_type(mut self, contract_type: ContractType) -> Self {
        self.0.contract_type = Some(contract_type);
        self
    }

    #[must_use]
    pub fn plain_english_input(mut self, input: Option<String>) -> Self {
        self.0.plain_english_input = Some(input);
        self
    }

    #[must_use]
    pub fn client_name(mut self, name: Option<String>) -> Self {
        self.0.client_name = Some(name);
        self
    }

    #[must_use]
    pub fn client_email(mut self, email: Option<String>) -> Self {
        self.0.client_email = Some(email);
        self
    }

    #[must_use]
    pub fn supplier_name(mut self, name: Option<String>) -> Self {
        self.0.supplier_name = Some(name);
        self
    }

    #[must_use]
    pub const fn contract_value(mut self, value: Option<f64>) -> Self {
        self.0.contract_value = Some(value);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.0.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub const fn start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.0.start_date = Some(date);
        self
    }

    #[must_use]
    pub const fn end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.0.end_date = Some(date);
        self
    }

    #[must_use]
    pub fn final_content(mut self, content: Option<String>) -> Self {
        self.0.final_content = Some(content);
        self
    }

    #[must_use]
    pub fn change_summary(mut self, summary: impl Into<String>) -> Self {
        self.0.change_summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ContractUpdate {
        self.0
    }
}
