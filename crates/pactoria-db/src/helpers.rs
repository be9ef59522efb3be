//! Row-to-entity parsing helpers.
//!
//! Every repo needs to convert `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic and handle the dual datetime
//! format issue (`SQLite`'s `datetime('now')` vs Rust's `to_rfc3339()`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;

use pactoria_core::enums::EntityType;

use crate::error::DatabaseError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse an optional `YYYY-MM-DD` TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string is not a calendar date.
pub fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|e| DatabaseError::Query(format!("Failed to parse date '{s}': {e}"))),
        _ => Ok(None),
    }
}

/// Render a date the way it is stored.
#[must_use]
pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all pactoria-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
/// You must use `get::<Option<String>>()` for nullable columns.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read a nullable REAL column.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_f64(row: &libsql::Row, idx: i32) -> Result<Option<f64>, DatabaseError> {
    // Aggregates over REAL columns can come back as INTEGER.
    #[allow(clippy::cast_precision_loss)]
    match row.get_value(idx)? {
        libsql::Value::Null => Ok(None),
        libsql::Value::Real(v) => Ok(Some(v)),
        libsql::Value::Integer(v) => Ok(Some(v as f64)),
        other => Err(DatabaseError::Other(anyhow::anyhow!(
            "column {idx}: expected a number, got {other:?}"
        ))),
    }
}

/// Read an INTEGER 0/1 column as `bool`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Read a non-negative INTEGER column as `u32`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is negative or too large.
pub fn get_u32(row: &libsql::Row, idx: i32) -> Result<u32, DatabaseError> {
    let v = row.get::<i64>(idx)?;
    u32::try_from(v).map_err(|_| DatabaseError::Query(format!("column {idx} out of range: {v}")))
}

/// Read a COUNT(*)-style column as `u64`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is negative.
pub fn get_count(row: &libsql::Row, idx: i32) -> Result<u64, DatabaseError> {
    let v = row.get::<i64>(idx)?;
    u64::try_from(v).map_err(|_| DatabaseError::Query(format!("negative count: {v}")))
}

/// Extract an optional JSON value from a TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json(s: Option<&str>) -> Result<Option<serde_json::Value>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => {
            let val = serde_json::from_str(s)
                .map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))?;
            Ok(Some(val))
        }
        _ => Ok(None),
    }
}

/// Decode a JSON TEXT column into a typed value.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the JSON does not match `T`.
pub fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))
}

/// Encode a value for a JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Other` if serialization fails.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(DatabaseError::json)
}

/// `i64` bind value for an unsigned count or version.
#[must_use]
pub fn sql_int(v: u32) -> i64 {
    i64::from(v)
}

/// Bind value for an optional string.
#[must_use]
pub fn opt_text(v: Option<&str>) -> libsql::Value {
    v.map_or(libsql::Value::Null, |s| libsql::Value::Text(s.to_string()))
}

/// Bind value for an optional float.
#[must_use]
pub fn opt_real(v: Option<f64>) -> libsql::Value {
    v.map_or(libsql::Value::Null, libsql::Value::Real)
}

/// Bind value for an optional date.
#[must_use]
pub fn opt_date(v: Option<NaiveDate>) -> libsql::Value {
    v.map_or(libsql::Value::Null, |d| libsql::Value::Text(format_date(d)))
}

/// Map `EntityType` to the corresponding SQL table name.
///
/// Uses exhaustive match: adding a new `EntityType` variant forces updating this.
#[must_use]
pub const fn entity_type_to_table(entity: EntityType) -> &'static str {
    match entity {
        EntityType::User => "users",
        EntityType::Company => "companies",
        EntityType::Contract => "contracts",
        EntityType::Template => "templates",
        EntityType::Clause => "clauses",
        EntityType::Invitation => "invitations",
        EntityType::Notification => "notifications",
        EntityType::Wizard => "wizard_sessions",
        EntityType::Integration => "integrations",
    }
}

/// Quote user text for an FTS5 `MATCH`: each whitespace-separated term
/// becomes a prefix-matching phrase, so operators in the input are inert.
#[must_use]
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split_whitespace()
        .map(|t| t.replace('"', ""))
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{t}\"*"))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("2026-02-09T14:30:00+00:00")]
    #[case("2026-02-09 14:30:00")]
    fn datetime_formats(#[case] s: &str) {
        let dt = parse_datetime(s).unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "14:30");
    }

    #[test]
    fn bad_datetime_is_query_error() {
        assert!(matches!(parse_datetime("yesterday"), Err(DatabaseError::Query(_))));
    }

    #[test]
    fn date_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert_eq!(parse_optional_date(Some(&format_date(d))).unwrap(), Some(d));
        assert_eq!(parse_optional_date(Some("")).unwrap(), None);
    }

    #[test]
    fn enum_parsing() {
        let s: pactoria_core::enums::ContractStatus = parse_enum("review").unwrap();
        assert_eq!(s.as_str(), "review");
        assert!(parse_enum::<pactoria_core::enums::ContractStatus>("nope").is_err());
    }

    #[rstest]
    #[case("service agreement", Some("\"service\"* \"agreement\"*"))]
    #[case("  acme ", Some("\"acme\"*"))]
    #[case("a\"b OR", Some("\"ab\"* \"OR\"*"))]
    #[case("   ", None)]
    #[case("\"\"", None)]
    fn fts_query_quotes_terms(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(fts_query(input).as_deref(), expected);
    }
}
