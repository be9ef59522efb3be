use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ContractStatus, ContractType};
use crate::errors::CoreError;
use crate::validation::{self, MAX_NAME_LEN, MAX_PLAIN_ENGLISH_LEN, MAX_TITLE_LEN};

pub const DEFAULT_CURRENCY: &str = "GBP";

/// A contract owned by one company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Contract {
    pub id: String,
    pub company_id: String,
    pub template_id: Option<String>,
    pub title: String,
    pub contract_type: ContractType,
    pub status: ContractStatus,
    pub plain_english_input: Option<String>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub supplier_name: Option<String>,
    pub contract_value: Option<f64>,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub generated_content: Option<String>,
    pub final_content: Option<String>,
    pub compliance_score: Option<f64>,
    pub risk_score: Option<f64>,
    pub ai_model: Option<String>,
    pub version: u32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// The text that counts as the contract: the edited final version when
    /// present, otherwise the AI-generated draft.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.final_content
            .as_deref()
            .or(self.generated_content.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    /// Days from `today` until `end_date` (negative once passed).
    #[must_use]
    pub fn days_until_end(&self, today: NaiveDate) -> Option<i64> {
        self.end_date.map(|end| (end - today).num_days())
    }
}

/// A snapshot of contract content, written whenever the content changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ContractVersion {
    pub id: String,
    pub contract_id: String,
    pub version: u32,
    pub content: String,
    pub change_summary: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewContract {
    pub title: String,
    pub contract_type: ContractType,
    #[serde(default)]
    pub plain_english_input: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub contract_value: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub template_id: Option<String>,
}

impl NewContract {
    pub fn validate(self) -> Result<Self, CoreError> {
        validation::contract_value(self.contract_value)?;
        validation::date_range(self.start_date, self.end_date)?;
        Ok(Self {
            title: validation::required_text("title", &self.title, MAX_TITLE_LEN)?,
            contract_type: self.contract_type,
            plain_english_input: validation::optional_text(
                "plain_english_input",
                self.plain_english_input.as_deref(),
                MAX_PLAIN_ENGLISH_LEN,
            )?,
            client_name: validation::optional_text(
                "client_name",
                self.client_name.as_deref(),
                MAX_NAME_LEN,
            )?,
            client_email: self
                .client_email
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|e| validation::email("client_email", e))
                .transpose()?,
            supplier_name: validation::optional_text(
                "supplier_name",
                self.supplier_name.as_deref(),
                MAX_NAME_LEN,
            )?,
            contract_value: self.contract_value,
            currency: Some(validation::currency(
                self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
            )?),
            start_date: self.start_date,
            end_date: self.end_date,
            template_id: self.template_id.filter(|s| !s.trim().is_empty()),
        })
    }
}
