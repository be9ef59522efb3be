use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ContractType, TemplateStatus, VariableType};
use crate::errors::CoreError;
use crate::validation::{self, MAX_NAME_LEN};

pub const DEFAULT_JURISDICTION: &str = "England and Wales";
const MAX_TEMPLATE_LEN: usize = 100_000;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder regex"));

/// A declared `{{ name }}` slot in a template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TemplateVariable {
    pub name: String,
    pub label: String,
    pub var_type: VariableType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TemplateVariable {
    /// Check `value` against the declared type.
    fn check(&self, value: &str) -> Result<(), CoreError> {
        let field = format!("variables.{}", self.name);
        let ok = match self.var_type {
            VariableType::Text => true,
            VariableType::Number => value.trim().parse::<f64>().is_ok_and(f64::is_finite),
            VariableType::Currency => value
                .trim()
                .trim_start_matches('£')
                .replace(',', "")
                .parse::<f64>()
                .is_ok_and(|v| v.is_finite() && v >= 0.0),
            VariableType::Date => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok(),
            VariableType::Email => validation::email(&field, value).is_ok(),
            VariableType::Boolean => matches!(value.trim(), "true" | "false"),
        };
        if ok {
            Ok(())
        } else {
            Err(CoreError::validation(
                field,
                format!("'{value}' is not a valid {}", self.var_type),
            ))
        }
    }
}

/// A reusable contract template with `{{ variable }}` placeholders.
///
/// `company_id == None` marks a system template visible to every company.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LegalTemplate {
    pub id: String,
    pub company_id: Option<String>,
    pub name: String,
    pub category: ContractType,
    pub description: Option<String>,
    pub content: String,
    pub variables: Vec<TemplateVariable>,
    pub status: TemplateStatus,
    pub version: u32,
    pub jurisdiction: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Placeholder names in `content`, in first-appearance order, deduplicated.
#[must_use]
pub fn placeholders(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_RE
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Every placeholder must be declared, and every declared name must be a
/// unique identifier.
fn validate_variables(content: &str, variables: &[TemplateVariable]) -> Result<(), CoreError> {
    let mut declared = HashSet::new();
    for var in variables {
        validation::identifier("variables.name", &var.name)?;
        if !declared.insert(var.name.as_str()) {
            return Err(CoreError::validation(
                "variables",
                format!("variable '{}' is declared twice", var.name),
            ));
        }
        if let Some(default) = &var.default_value {
            var.check(default)?;
        }
    }
    for name in placeholders(content) {
        if !declared.contains(name.as_str()) {
            return Err(CoreError::validation(
                "content",
                format!("placeholder '{{{{{name}}}}}' has no declared variable"),
            ));
        }
    }
    Ok(())
}

impl LegalTemplate {
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        placeholders(&self.content)
    }

    pub fn validate_variables(&self) -> Result<(), CoreError> {
        validate_variables(&self.content, &self.variables)
    }

    /// Fill placeholders from `values`, falling back to defaults.
    ///
    /// Fails on a missing required value or a value of the wrong type.
    /// Optional variables with neither value nor default render empty.
    pub fn render(&self, values: &BTreeMap<String, String>) -> Result<String, CoreError> {
        let mut resolved: BTreeMap<&str, String> = BTreeMap::new();
        for var in &self.variables {
            let value = values
                .get(&var.name)
                .filter(|v| !v.trim().is_empty())
                .or(var.default_value.as_ref());
            match value {
                Some(v) => {
                    var.check(v)?;
                    resolved.insert(var.name.as_str(), v.clone());
                }
                None if var.required => {
                    return Err(CoreError::validation(
                        format!("variables.{}", var.name),
                        "is required",
                    ));
                }
                None => {
                    resolved.insert(var.name.as_str(), String::new());
                }
            }
        }

        let rendered = PLACEHOLDER_RE.replace_all(&self.content, |caps: &regex::Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            resolved
                .get(name)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        });
        Ok(rendered.into_owned())
    }

    /// Only active templates may seed new contracts.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.status == TemplateStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewTemplate {
    pub name: String,
    pub category: ContractType,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub variables: Vec<TemplateVariable>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

impl NewTemplate {
    pub fn validate(self) -> Result<Self, CoreError> {
        let content = validation::required_text("content", &self.content, MAX_TEMPLATE_LEN)?;
        validate_variables(&content, &self.variables)?;
        Ok(Self {
            name: validation::required_text("name", &self.name, MAX_NAME_LEN)?,
            category: self.category,
            description: validation::optional_text(
                "description",
                self.description.as_deref(),
                2000,
            )?,
            content,
            variables: self.variables,
            jurisdiction: Some(
                validation::optional_text("jurisdiction", self.jurisdiction.as_deref(), 100)?
                    .unwrap_or_else(|| DEFAULT_JURISDICTION.to_string()),
            ),
        })
    }
}
