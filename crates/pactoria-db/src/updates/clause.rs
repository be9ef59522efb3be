//! Clause update builder.

use serde::{Deserialize, Serialize};

use pactoria_core::entities::normalize_tags;
use pactoria_core::enums::{ClauseCategory, RiskLevel};
use pactoria_core::errors::CoreError;
use pactoria_core::validation::{self, MAX_TITLE_LEN};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClauseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ClauseCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mandatory: Option<bool>,
}

impl ClauseUpdate {
    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            title: self
                .title
                .map(|t| validation::required_text("title", &t, MAX_TITLE_LEN))
                .transpose()?,
            content: self
                .content
                .map(|c| validation::required_text("content", &c, 20_000))
                .transpose()?,
            tags: self.tags.map(|t| normalize_tags(&t)).transpose()?,
            ..self
        })
    }
}

pub struct ClauseUpdateBuilder(ClauseUpdate);

impl Default for ClauseUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClauseUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ClauseUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn category(mut self, category: ClauseCategory) -> Self {
        self.0.category = Some(category);
        self
    }

    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.0.content = Some(content.into());
        self
    }

    #[must_use]
    pub const fn risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.0.risk_level = Some(risk_level);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.0.tags = Some(tags);
        self
    }

    #[must_use]
    pub const fn is_mandatory(mut self, mandatory: bool) -> Self {
        self.0.is_mandatory = Some(mandatory);
        self
    }

    #[must_use]
    pub fn build(self) -> ClauseUpdate {
        self.0
    }
}
