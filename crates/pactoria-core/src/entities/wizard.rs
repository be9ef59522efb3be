use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::NewContract;
use crate::enums::{ContractType, WizardStatus};
use crate::errors::CoreError;
use crate::validation::{self, MAX_NAME_LEN, MAX_PLAIN_ENGLISH_LEN, MAX_TITLE_LEN};

pub const WIZARD_STEPS: u8 = 3;

/// Step 1: what kind of contract and what it should say.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WizardStep1 {
    pub title: String,
    pub contract_type: ContractType,
    #[serde(default)]
    pub plain_english_input: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
}

/// Step 2: who the parties are.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WizardStep2 {
    pub client_name: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub supplier_name: Option<String>,
}

/// Step 3: money and dates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WizardStep3 {
    #[serde(default)]
    pub contract_value: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct WizardData {
    #[serde(default)]
    pub step1: Option<WizardStep1>,
    #[serde(default)]
    pub step2: Option<WizardStep2>,
    #[serde(default)]
    pub step3: Option<WizardStep3>,
}

/// A guided three-step contract creation flow. Completing it creates a
/// contract from the collected data.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct WizardSession {
    pub id: String,
    pub company_id: String,
    pub user_id: String,
    pub current_step: u8,
    pub status: WizardStatus,
    pub data: WizardData,
    pub contract_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn parse_step<T: for<'de> Deserialize<'de>>(
    step: u8,
    payload: serde_json::Value,
) -> Result<T, CoreError> {
    serde_json::from_value(payload)
        .map_err(|e| CoreError::validation(format!("step{step}"), e.to_string()))
}

impl WizardStep1 {
    fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            title: validation::required_text("title", &self.title, MAX_TITLE_LEN)?,
            contract_type: self.contract_type,
            plain_english_input: validation::optional_text(
                "plain_english_input",
                self.plain_english_input.as_deref(),
                MAX_PLAIN_ENGLISH_LEN,
            )?,
            template_id: self.template_id.filter(|s| !s.trim().is_empty()),
        })
    }
}

impl WizardStep2 {
    fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            client_name: validation::required_text("client_name", &self.client_name, MAX_NAME_LEN)?,
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
        })
    }
}

impl WizardStep3 {
    fn validate(self) -> Result<Self, CoreError> {
        validation::contract_value(self.contract_value)?;
        validation::date_range(self.start_date, self.end_date)?;
        Ok(Self {
            currency: self
                .currency
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(validation::currency)
                .transpose()?,
            ..self
        })
    }
}

impl WizardSession {
    /// Validate and store the payload for step `step`.
    ///
    /// A step may be submitted when it is the current step or a revisit of
    /// an earlier one. `current_step` only moves forward.
    pub fn apply_step(&mut self, step: u8, payload: serde_json::Value) -> Result<(), CoreError> {
        if self.status != WizardStatus::InProgress {
            return Err(CoreError::business_rule(format!(
                "wizard session {} is {}",
                self.id, self.status
            )));
        }
        if step == 0 || step > WIZARD_STEPS {
            return Err(CoreError::validation(
                "step",
                format!("must be between 1 and {WIZARD_STEPS}"),
            ));
        }
        if step > self.current_step {
            return Err(CoreError::business_rule(format!(
                "step {step} cannot be submitted before step {}",
                self.current_step
            )));
        }
        match step {
            1 => self.data.step1 = Some(parse_step::<WizardStep1>(step, payload)?.validate()?),
            2 => self.data.step2 = Some(parse_step::<WizardStep2>(step, payload)?.validate()?),
            _ => self.data.step3 = Some(parse_step::<WizardStep3>(step, payload)?.validate()?),
        }
        self.current_step = self.current_step.max(step + 1).min(WIZARD_STEPS);
        Ok(())
    }

    #[must_use]
    pub const fn ready_to_complete(&self) -> bool {
        self.data.step1.is_some() && self.data.step2.is_some() && self.data.step3.is_some()
    }

    /// Assemble the collected steps into contract input.
    pub fn to_new_contract(&self) -> Result<NewContract, CoreError> {
        let (Some(s1), Some(s2), Some(s3)) = (&self.data.step1, &self.data.step2, &self.data.step3)
        else {
            return Err(CoreError::business_rule(
                "all three wizard steps must be completed first",
            ));
        };
        NewContract {
            title: s1.title.clone(),
            contract_type: s1.contract_type,
            plain_english_input: s1.plain_english_input.clone(),
            client_name: Some(s2.client_name.clone()),
            client_email: s2.client_email.clone(),
            supplier_name: s2.supplier_name.clone(),
            contract_value: s3.contract_value,
            currency: s3.currency.clone(),
            start_date: s3.start_date,
            end_date: s3.end_date,
            template_id: s1.template_id.clone(),
        }
        .validate()
    }
}
