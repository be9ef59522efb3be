//! Keyword heuristics scoring contract text against expected UK terms.
//!
//! Each area holds keyword groups; a group matches when any of its
//! keywords appears (case-insensitive). An area scores the fraction of its
//! groups matched and the overall score is the weight-averaged area score.

use serde::{Deserialize, Serialize};

use pactoria_core::enums::ContractType;

/// Recommendations are raised for areas scoring below this.
const WEAK_AREA: f64 = 0.5;

struct Area {
    key: &'static str,
    label: &'static str,
    weight: f64,
    groups: &'static [&'static [&'static str]],
    recommendation: &'static str,
    applies: fn(Option<ContractType>) -> bool,
}

const fn always(_: Option<ContractType>) -> bool {
    true
}

fn employment(t: Option<ContractType>) -> bool {
    t == Some(ContractType::EmploymentContract)
}

fn consumer_facing(t: Option<ContractType>) -> bool {
    t == Some(ContractType::TermsAndConditions)
}

fn creates_work(t: Option<ContractType>) -> bool {
    matches!(t, Some(ContractType::Consultancy | ContractType::ServiceAgreement))
}

const AREAS: &[Area] = &[
    Area {
        key: "governing_law",
        label: "Governing law",
        weight: 1.0,
        groups: &[
            &["governing law", "governed by"],
            &["england and wales", "english law", "laws of scotland", "northern ireland"],
            &["jurisdiction", "courts of"],
        ],
        recommendation: "Add a clause stating the agreement is governed by the law of England and Wales \
                         and naming the courts with jurisdiction.",
        applies: always,
    },
    Area {
        key: "data_protection",
        label: "Data protection",
        weight: 1.0,
        groups: &[
            &["gdpr", "general data protection regulation"],
            &["data protection act", "data protection legislation"],
            &["personal data"],
        ],
        recommendation: "Add data protection obligations referring to the UK GDPR and the Data Protection Act 2018.",
        applies: always,
    },
    Area {
        key: "termination",
        label: "Termination",
        weight: 0.8,
        groups: &[&["terminat"], &["notice"], &["breach", "insolven"]],
        recommendation: "Set out termination rights, notice periods, and termination for breach or insolvency.",
        applies: always,
    },
    Area {
        key: "liability",
        label: "Liability",
        weight: 0.8,
        groups: &[&["liabilit", "liable"], &["limit", "cap"], &["indemn"]],
        recommendation: "Add a limitation of liability clause with a cap and any indemnities.",
        applies: always,
    },
    Area {
        key: "payment_terms",
        label: "Payment terms",
        weight: 0.6,
        groups: &[&["payment", "invoice", "fee"], &["days"], &["late payment", "interest"]],
        recommendation: "State payment amounts, due dates, and interest on late payment.",
        applies: always,
    },
    Area {
        key: "dispute_resolution",
        label: "Dispute resolution",
        weight: 0.5,
        groups: &[&["dispute"], &["mediation", "arbitration", "adr"]],
        recommendation: "Add an escalation and mediation step before court proceedings.",
        applies: always,
    },
    Area {
        key: "confidentiality",
        label: "Confidentiality",
        weight: 0.6,
        groups: &[&["confidential"], &["disclos"]],
        recommendation: "Add confidentiality obligations and permitted disclosures.",
        applies: always,
    },
    Area {
        key: "employment_rights",
        label: "Employment rights",
        weight: 1.0,
        groups: &[
            &["holiday", "annual leave"],
            &["notice"],
            &["working time", "hours of work"],
            &["sick pay", "sickness"],
            &["pension"],
        ],
        recommendation: "Include the statutory particulars: hours, holiday, sick pay, pension, and notice.",
        applies: employment,
    },
    Area {
        key: "consumer_rights",
        label: "Consumer rights",
        weight: 1.0,
        groups: &[
            &["consumer rights act"],
            &["statutory rights"],
            &["cancel", "cooling-off", "cooling off", "refund"],
        ],
        recommendation: "Reference the Consumer Rights Act 2015 and preserve consumers' statutory rights.",
        applies: consumer_facing,
    },
    Area {
        key: "intellectual_property",
        label: "Intellectual property",
        weight: 0.7,
        groups: &[&["intellectual property"], &["owner", "assign", "licen"]],
        recommendation: "State who owns intellectual property created under the agreement.",
        applies: creates_work,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaScore {
    pub area: String,
    pub label: String,
    pub score: f64,
    pub matched: u32,
    pub total: u32,
}

/// Result of checking one contract text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Weighted score in `[0, 1]`.
    pub overall_score: f64,
    /// 1 (low) to 10 (high).
    pub risk_score: f64,
    pub areas: Vec<AreaScore>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

#[must_use]
pub fn risk_from_compliance(overall: f64) -> f64 {
    ((1.0 - overall.clamp(0.0, 1.0)) * 9.0).round() + 1.0
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceChecker;

impl ComplianceChecker {
    #[must_use]
    pub fn check(&self, content: &str, contract_type: Option<ContractType>) -> ComplianceReport {
        if content.trim().is_empty() {
            return ComplianceReport {
                overall_score: 0.0,
                risk_score: risk_from_compliance(0.0),
                areas: Vec::new(),
                issues: vec!["The contract has no content to check.".to_string()],
                recommendations: Vec::new(),
            };
        }

        let text = content.to_lowercase();
        let mut areas = Vec::new();
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let mut weighted = 0.0;
        let mut weights = 0.0;

        for area in AREAS.iter().filter(|a| (a.applies)(contract_type)) {
            let mut matched = 0_u32;
            for group in area.groups {
                if group.iter().any(|kw| text.contains(kw)) {
                    matched += 1;
                } else {
                    issues.push(format!("{}: no mention of \"{}\".", area.label, group[0]));
                }
            }
            let total = u32::try_from(area.groups.len()).unwrap_or(u32::MAX);
            let score = f64::from(matched) / f64::from(total.max(1));
            if score < WEAK_AREA {
                recommendations.push(area.recommendation.to_string());
            }
            weighted += score * area.weight;
            weights += area.weight;
            areas.push(AreaScore {
                area: area.key.to_string(),
                label: area.label.to_string(),
                score,
                matched,
                total,
            });
        }

        let overall_score = if weights > 0.0 { (weighted / weights).clamp(0.0, 1.0) } else { 0.0 };
        tracing::debug!(overall_score, issues = issues.len(), "compliance check");
        ComplianceReport {
            overall_score,
            risk_score: risk_from_compliance(overall_score),
            areas,
            issues,
            recommendations,
        }
    }
}
