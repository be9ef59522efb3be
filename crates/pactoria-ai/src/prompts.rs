//! Prompt construction and heuristic parsing of analysis replies.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pactoria_core::entities::Contract;
use pactoria_core::enums::ContractType;

pub const DRAFTING_SYSTEM_PROMPT: &str = "You are an experienced solicitor in England and Wales who drafts \
clear, enforceable commercial contracts for small and medium-sized UK businesses. Write in plain English, \
use numbered sections, and never invent facts about the parties.";

pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a UK contract reviewer. You identify legal and commercial \
risks in contracts governed by the law of England and Wales and answer only in the requested line format.";

/// Structured input for drafting one contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub title: String,
    pub contract_type: Option<ContractType>,
    #[serde(default)]
    pub plain_english_input: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
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
    /// A rendered template to base the draft on.
    #[serde(default)]
    pub template_text: Option<String>,
    /// Approved clause texts that must appear in the draft.
    #[serde(default)]
    pub clauses: Vec<ClauseText>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseText {
    pub title: String,
    pub content: String,
}

impl GenerationRequest {
    #[must_use]
    pub fn from_contract(contract: &Contract) -> Self {
        Self {
            title: contract.title.clone(),
            contract_type: Some(contract.contract_type),
            plain_english_input: contract.plain_english_input.clone(),
            client_name: contract.client_name.clone(),
            supplier_name: contract.supplier_name.clone(),
            contract_value: contract.contract_value,
            currency: Some(contract.currency.clone()),
            start_date: contract.start_date,
            end_date: contract.end_date,
            template_text: None,
            clauses: Vec::new(),
        }
    }
}

fn type_specific_guidance(contract_type: ContractType) -> &'static str {
    match contract_type {
        ContractType::EmploymentContract => {
            "Include the written statement particulars required by the Employment Rights Act 1996, \
             holiday entitlement under the Working Time Regulations 1998, and notice periods."
        }
        ContractType::TermsAndConditions => {
            "Where the customer may be a consumer, respect the Consumer Rights Act 2015 and do not \
             exclude statutory rights."
        }
        ContractType::Nda => "Define confidential information, permitted disclosures, and the duration of the obligations.",
        ContractType::Consultancy | ContractType::ServiceAgreement => {
            "State who owns intellectual property created under the agreement and address IR35 status \
             where an individual consultant is involved."
        }
        ContractType::SupplierAgreement => "Cover delivery, acceptance, risk and title, and late payment interest.",
        ContractType::Partnership => "Cover capital contributions, profit sharing, decision making, and exit.",
        ContractType::Lease => "Cover rent, rent review, repairs, permitted use, and break clauses.",
        ContractType::Other => "Include the sections a UK commercial agreement of this kind normally needs.",
    }
}

/// Build the drafting prompt for `request`.
#[must_use]
pub fn contract_generation_prompt(request: &GenerationRequest) -> String {
    let kind = request.contract_type.map_or("contract", ContractType::label);
    let mut prompt = format!("Draft a {kind} governed by the law of England and Wales.\n\n");
    let _ = writeln!(prompt, "Title: {}", request.title);
    if let Some(client) = &request.client_name {
        let _ = writeln!(prompt, "Client: {client}");
    }
    if let Some(supplier) = &request.supplier_name {
        let _ = writeln!(prompt, "Supplier: {supplier}");
    }
    if let Some(value) = request.contract_value {
        let currency = request.currency.as_deref().unwrap_or("GBP");
        let _ = writeln!(prompt, "Contract value: {value:.2} {currency}");
    }
    if let Some(start) = request.start_date {
        let _ = writeln!(prompt, "Start date: {start}");
    }
    if let Some(end) = request.end_date {
        let _ = writeln!(prompt, "End date: {end}");
    }
    if let Some(input) = request.plain_english_input.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = write!(prompt, "\nWhat the parties want, in their words:\n{}\n", input.trim());
    }
    if let Some(template) = &request.template_text {
        let _ = write!(prompt, "\nBase the draft on this template:\n---\n{template}\n---\n");
    }
    if !request.clauses.is_empty() {
        prompt.push_str("\nInclude these approved clauses, adapting only party names:\n");
        for clause in &request.clauses {
            let _ = write!(prompt, "\n[{}]\n{}\n", clause.title, clause.content);
        }
    }

    prompt.push_str(
        "\nRequirements:\n\
         - Use numbered sections with headings.\n\
         - Include governing law and jurisdiction (England and Wales).\n\
         - Address data protection under the UK GDPR and the Data Protection Act 2018 where personal data is processed.\n\
         - Include termination, limitation of liability, payment terms, confidentiality, and dispute resolution.\n",
    );
    if let Some(contract_type) = request.contract_type {
        let _ = writeln!(prompt, "- {}", type_specific_guidance(contract_type));
    }
    prompt.push_str("- Write in plain English and return only the contract text.\n");
    prompt
}

/// Build the review prompt for `content`.
#[must_use]
pub fn contract_analysis_prompt(content: &str, contract_type: Option<ContractType>) -> String {
    let kind = contract_type.map_or("contract", ContractType::label);
    format!(
        "Review the following {kind} under the law of England and Wales.\n\n\
         Answer with one finding per line, each starting with one of:\n\
         WARNING: a legal problem or missing protection\n\
         RISK: a commercial or compliance risk\n\
         SUGGESTION: an improvement to wording or structure\n\
         RECOMMENDATION: an action the business should take\n\
         Finish with a line `SCORE: x` where x is overall compliance between 0 and 1.\n\n\
         Contract:\n---\n{content}\n---\n"
    )
}

/// Findings extracted from an analysis reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    /// Reported compliance score, clamped to `[0, 1]`.
    pub score: Option<f64>,
}

const WARNING_PREFIXES: [&str; 2] = ["warning:", "risk:"];
const SUGGESTION_PREFIXES: [&str; 2] = ["suggestion:", "recommendation:"];
const WARNING_WORDS: [&str; 4] = ["missing", "unclear", "ambiguous", "risk"];
const SUGGESTION_WORDS: [&str; 3] = ["should", "consider", "recommend"];

fn strip_bullet(line: &str) -> &str {
    let line = line.trim_start_matches(['-', '*', '•', ' ', '\t']);
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && line[digits..].starts_with(['.', ')']) {
        line[digits + 1..].trim_start()
    } else {
        line
    }
}

fn strip_prefix_ci<'a>(line: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| {
        line.get(..p.len())
            .filter(|head| head.eq_ignore_ascii_case(p))
            .map(|_| line[p.len()..].trim())
    })
}

fn parse_score(raw: &str) -> Option<f64> {
    let raw = raw.trim().trim_end_matches('.');
    let value = if let Some(pct) = raw.strip_suffix('%') {
        pct.trim().parse::<f64>().ok()? / 100.0
    } else if let Some((num, den)) = raw.split_once('/') {
        let den: f64 = den.trim().parse().ok()?;
        if den <= 0.0 {
            return None;
        }
        num.trim().parse::<f64>().ok()? / den
    } else {
        raw.split_whitespace().next()?.parse().ok()?
    };
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

/// Sort reply lines into warnings and suggestions and pick up the score.
///
/// Prefixed lines are classified by prefix. Other lines fall back to
/// keyword matching; lines matching neither are ignored.
#[must_use]
pub fn parse_analysis(text: &str) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    for line in text.lines() {
        let line = strip_bullet(line.trim());
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = strip_prefix_ci(line, &["score:"]) {
            if let Some(score) = parse_score(rest) {
                result.score = Some(score);
            }
        } else if let Some(rest) = strip_prefix_ci(line, &WARNING_PREFIXES) {
            if !rest.is_empty() {
                result.warnings.push(rest.to_string());
            }
        } else if let Some(rest) = strip_prefix_ci(line, &SUGGESTION_PREFIXES) {
            if !rest.is_empty() {
                result.suggestions.push(rest.to_string());
            }
        } else {
            let lower = line.to_lowercase();
            if WARNING_WORDS.iter().any(|w| lower.contains(w)) {
                result.warnings.push(line.to_string());
            } else if SUGGESTION_WORDS.iter().any(|w| lower.contains(w)) {
                result.suggestions.push(line.to_string());
            }
        }
    }
    result
}
