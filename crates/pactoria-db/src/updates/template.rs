//! Template update builder.

use serde::{Deserialize, Serialize};

use pactoria_core::entities::TemplateVariable;
use pactoria_core::enums::ContractType;
use pactoria_core::errors::CoreError;
use pactoria_core::validation::{self, MAX_NAME_LEN};

use super::double_option;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ContractType>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<TemplateVariable>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
}

impl TemplateUpdate {
    /// Field-level validation. Placeholder/variable agreement is checked by
    /// the repository against the merged template.
    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            name: self
                .name
                .map(|n| validation::required_text("name", &n, MAX_NAME_LEN))
                .transpose()?,
            category: self.category,
            description: self
                .description
                .map(|d| validation::optional_text("description", d.as_deref(), 2000))
                .transpose()?,
            content: self
                .content
                .map(|c| validation::required_text("content", &c, 100_000))
                .transpose()?,
            variables: self.variables,
            jurisdiction: self
                .jurisdiction
                .map(|j| validation::required_text("jurisdiction", &j, 100))
                .transpose()?,
        })
    }

    /// Content or variable changes produce a new template version.
    #[must_use]
    pub const fn changes_body(&self) -> bool {
        self.content.is_some() || self.variables.is_some()
    }
}

pub struct TemplateUpdateBuilder(TemplateUpdate);

impl Default for TemplateUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(TemplateUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn category(mut self, category: ContractType) -> Self {
        self.0.category = Some(category);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.0.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn variables(mut self, variables: Vec<TemplateVariable>) -> Self {
        self.0.variables = Some(variables);
        self
    }

    #[must_use]
    pub fn jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.0.jurisdiction = Some(jurisdiction.into());
        self
    }

    #[must_use]
    pub fn build(self) -> TemplateUpdate {
        self.0
    }
}
