use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ClauseCategory, ClauseStatus, RiskLevel};
use crate::errors::CoreError;
use crate::validation::{self, MAX_TITLE_LEN};

const MAX_CLAUSE_LEN: usize = 20_000;
const MAX_TAGS: usize = 20;
const MAX_TAG_LEN: usize = 50;

/// A reusable clause in a company's clause library.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LegalClause {
    pub id: String,
    pub company_id: String,
    pub title: String,
    pub category: ClauseCategory,
    pub content: String,
    pub risk_level: RiskLevel,
    pub status: ClauseStatus,
    pub tags: Vec<String>,
    pub is_mandatory: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewClause {
    pub title: String,
    pub category: ClauseCategory,
    pub content: String,
    #[serde(default = "default_risk")]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_mandatory: bool,
}

const fn default_risk() -> RiskLevel {
    RiskLevel::Low
}

/// Lower-case, trim, and deduplicate tags, keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, CoreError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let t = tag.trim().to_lowercase();
        if t.is_empty() {
            continue;
        }
        if t.chars().count() > MAX_TAG_LEN {
            return Err(CoreError::validation(
                "tags",
                format!("tag '{t}' exceeds {MAX_TAG_LEN} characters"),
            ));
        }
        if !out.contains(&t) {
            out.push(t);
        }
    }
    if out.len() > MAX_TAGS {
        return Err(CoreError::validation(
            "tags",
            format!("at most {MAX_TAGS} tags allowed"),
        ));
    }
    Ok(out)
}

impl NewClause {
    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(Self {
            title: validation::required_text("title", &self.title, MAX_TITLE_LEN)?,
            category: self.category,
            content: validation::required_text("content", &self.content, MAX_CLAUSE_LEN)?,
            risk_level: self.risk_level,
            tags: normalize_tags(&self.tags)?,
            is_mandatory: self.is_mandatory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tags_are_normalized() {
        let c = NewClause {
            title: "Limitation of liability".into(),
            category: ClauseCategory::Liability,
            content: "Neither party shall be liable...".into(),
            risk_level: RiskLevel::High,
            tags: vec!["Cap".into(), " cap ".into(), String::new(), "Indirect".into()],
            is_mandatory: true,
        }
        .validate()
        .unwrap();
        assert_eq!(c.tags, vec!["cap", "indirect"]);
    }

    #[test]
    fn empty_content_rejected() {
        let err = NewClause {
            title: "T".into(),
            category: ClauseCategory::General,
            content: "   ".into(),
            risk_level: RiskLevel::Low,
            tags: vec![],
            is_mandatory: false,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation { field, .. } if field == "content"));
    }

    #[test]
    fn risk_level_defaults_to_low() {
        let json = serde_json::json!({
            "title": "Payment terms",
            "category": "payment",
            "content": "Invoices are payable within 30 days."
        });
        let c: NewClause = serde_json::from_value(json).unwrap();
        assert_eq!(c.risk_level, RiskLevel::Low);
    }
}
