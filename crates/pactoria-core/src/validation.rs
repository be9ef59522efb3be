//! Field validation shared by entity constructors and request handlers.
//!
//! Every check returns `CoreError::Validation` naming the offending field.
//! Normalizing checks (postcode, VAT, email) return the canonical form that
//! should be stored.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::errors::CoreError;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_PLAIN_ENGLISH_LEN: usize = 10_000;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

static POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(GIR ?0AA|[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2})$").expect("postcode regex")
});

static VAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^GB([0-9]{9}|[0-9]{12}|GD[0-9]{3}|HA[0-9]{3})$").expect("vat regex")
});

static COMPANY_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{8}|[A-Z]{2}[0-9]{6})$").expect("company number regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-']+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email regex")
});

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,63}$").expect("identifier regex"));

static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("currency regex"));

/// Trim `value` and require it to be non-empty and at most `max` chars.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > max {
        return Err(CoreError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`] but `None`/blank collapses to `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, CoreError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}

/// Validate and lower-case an email address.
pub fn email(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(trimmed) {
        return Err(CoreError::validation(field, "must be a valid email address"));
    }
    Ok(trimmed.to_lowercase())
}

/// Validate a UK postcode and return it upper-cased with a single space
/// before the three-character inward code.
pub fn uk_postcode(value: &str) -> Result<String, CoreError> {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if compact.len() < 5 || !POSTCODE_RE.is_match(&compact) {
        return Err(CoreError::validation("postcode", "must be a valid UK postcode"));
    }
    let (outward, inward) = compact.split_at(compact.len() - 3);
    Ok(format!("{outward} {inward}"))
}

/// Validate a UK VAT registration number (`GB` + 9 or 12 digits, or the
/// government/health authority forms). Spaces are stripped.
pub fn uk_vat_number(value: &str) -> Result<String, CoreError> {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if !VAT_RE.is_match(&compact) {
        return Err(CoreError::validation(
            "vat_number",
            "must be a valid UK VAT number (e.g. GB123456789)",
        ));
    }
    Ok(compact)
}

/// Validate a Companies House registration number (8 digits, or 2 letters + 6 digits).
pub fn company_number(value: &str) -> Result<String, CoreError> {
    let compact = value.trim().to_uppercase();
    if !COMPANY_NUMBER_RE.is_match(&compact) {
        return Err(CoreError::validation(
            "registration_number",
            "must be a Companies House number (8 digits or 2 letters + 6 digits)",
        ));
    }
    Ok(compact)
}

/// Password policy: 8–128 chars with at least one letter and one digit.
pub fn password(value: &str) -> Result<(), CoreError> {
    let len = value.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(CoreError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(CoreError::validation(
            "password",
            format!("must be at most {MAX_PASSWORD_LEN} characters"),
        ));
    }
    if !value.chars().any(char::is_alphabetic) || !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(CoreError::validation(
            "password",
            "must contain at least one letter and one digit",
        ));
    }
    Ok(())
}

/// Snake-case identifier used for template variable names.
pub fn identifier(field: &str, value: &str) -> Result<(), CoreError> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        Err(CoreError::validation(
            field,
            format!("'{value}' must be a lower-case identifier"),
        ))
    }
}

pub fn currency(value: &str) -> Result<String, CoreError> {
    let upper = value.trim().to_uppercase();
    if CURRENCY_RE.is_match(&upper) {
        Ok(upper)
    } else {
        Err(CoreError::validation("currency", "must be a 3-letter ISO code"))
    }
}

/// Monetary amounts must be finite and non-negative.
pub fn contract_value(value: Option<f64>) -> Result<(), CoreError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(CoreError::validation(
            "contract_value",
            "must be a non-negative amount",
        )),
        _ => Ok(()),
    }
}

pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), CoreError> {
    match (start, end) {
        (Some(s), Some(e)) if e <= s => Err(CoreError::validation(
            "end_date",
            "must be after start_date",
        )),
        _ => Ok(()),
    }
}

/// Compliance scores are fractions in [0, 1].
pub fn unit_score(field: &str, value: f64) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::validation(field, "must be between 0 and 1"))
    }
}

/// Risk scores run from 1 (low) to 10 (critical).
pub fn risk_score(value: f64) -> Result<(), CoreError> {
    if (1.0..=10.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::validation("risk_score", "must be between 1 and 10"))
    }
}
