//! Update types for entity mutations.
//!
//! Each update struct has `Option` fields; only `Some` fields generate SET
//! clauses in the dynamic UPDATE SQL. Nullable columns use `Option<Option<T>>`
//! so `Some(None)` clears the column. The same structs deserialize from API
//! request bodies (an explicit `null` clears, an absent key leaves the column
//! alone) and serialize as the audit `detail` (changed fields only).

pub mod clause;
pub mod company;
pub mod contract;
pub mod profile;
pub mod template;

use serde::{Deserialize, Deserializer};

/// Deserialize a present key (including `null`) as `Some(..)`.
///
/// Combined with `#[serde(default)]`, an absent key stays `None`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accumulates `col = ?n` assignments and their bind values.
#[derive(Debug, Default)]
pub(crate) struct SetList {
    sets: Vec<String>,
    params: Vec<libsql::Value>,
}

impl SetList {
    pub(crate) fn push(&mut self, column: &str, value: impl Into<libsql::Value>) {
        self.params.push(value.into());
        self.sets.push(format!("{column} = ?{}", self.params.len()));
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// `UPDATE {table} SET .. WHERE id = ?n` plus its parameters.
    pub(crate) fn into_update(mut self, table: &str, id: &str) -> (String, Vec<libsql::Value>) {
        self.params.push(libsql::Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE {table} SET {} WHERE id = ?{}",
            self.sets.join(", "),
            self.params.len()
        );
        (sql, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_list_numbers_placeholders() {
        let mut sets = SetList::default();
        assert!(sets.is_empty());
        sets.push("title", "New");
        sets.push("version", 2_i64);
        let (sql, params) = sets.into_update("contracts", "ctr-00000001");
        assert_eq!(sql, "UPDATE contracts SET title = ?1, version = ?2 WHERE id = ?3");
        assert_eq!(params.len(), 3);
    }

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "double_option")]
        note: Option<Option<String>>,
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.note, None);
        let null: Probe = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(null.note, Some(None));
        let set: Probe = serde_json::from_str(r#"{"note": "x"}"#).unwrap();
        assert_eq!(set.note, Some(Some("x".into())));
    }
}
