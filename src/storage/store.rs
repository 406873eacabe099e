//! The generic data store interface
//!
//! Every page of the dashboard talks to the data store through five calls:
//! `select`, `insert`, `update`, `delete` and `call`. Rows are plain JSON
//! objects; `DataStoreExt` converts them to and from the typed models.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{BranchbookError, BranchbookResult};

/// One table row
pub type Row = serde_json::Map<String, Value>;

/// Column equality match
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    /// `column = value`
    pub fn eq(column: impl Into<String>, value: impl Serialize) -> Self {
        Self {
            column: column.into(),
            value: serde_json::to_value(value).unwrap_or(Value::Null),
        }
    }

    /// A missing column compares equal to `null`
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column).unwrap_or(&Value::Null) == &self.value
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column, self.value)
    }
}

/// True when every filter matches
pub fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

pub(crate) fn describe(table: &str, filters: &[Filter]) -> String {
    let parts: Vec<String> = filters.iter().map(|f| f.to_string()).collect();
    format!("{} where {}", table, parts.join(" and "))
}

/// Outcome flag of a procedure call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureStatus {
    Success,
    Error,
}

/// Envelope returned by `DataStore::call`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureResponse {
    pub status: ProcedureStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProcedureResponse {
    pub fn success(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: ProcedureStatus::Success,
            message: message.into(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ProcedureStatus::Error,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProcedureStatus::Success
    }
}

/// The external data store
pub trait DataStore {
    /// Rows matching every filter, in insertion order. An empty `columns`
    /// slice returns whole rows.
    fn select(&self, table: &str, columns: &[&str], filters: &[Filter]) -> BranchbookResult<Vec<Row>>;

    /// Insert a row, assigning `id` and `created_at` when absent
    fn insert(&self, table: &str, payload: Row) -> BranchbookResult<Row>;

    /// Merge `payload` into the single row matching `filters`
    fn update(&self, table: &str, payload: Row, filters: &[Filter]) -> BranchbookResult<Row>;

    /// Delete every row matching `filters`, returning how many were removed
    fn delete(&self, table: &str, filters: &[Filter]) -> BranchbookResult<usize>;

    /// Run a named business procedure
    fn call(&self, procedure: &str, args: Value) -> BranchbookResult<ProcedureResponse>;
}

/// Serialize a model into a row
pub fn to_row<T: Serialize>(value: &T) -> BranchbookResult<Row> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(BranchbookError::Validation(format!(
            "Expected an object row, got {}",
            other
        ))),
    }
}

/// Deserialize a row into a model
pub fn from_row<T: DeserializeOwned>(table: &str, row: Row) -> BranchbookResult<T> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| BranchbookError::Storage(format!("Malformed row in '{}': {}", table, e)))
}

/// Typed helpers over any `DataStore`
pub trait DataStoreExt: DataStore {
    fn select_as<T: DeserializeOwned>(&self, table: &str, filters: &[Filter]) -> BranchbookResult<Vec<T>> {
        self.select(table, &[], filters)?
            .into_iter()
            .map(|row| from_row(table, row))
            .collect()
    }

    fn find_as<T: DeserializeOwned>(&self, table: &str, filters: &[Filter]) -> BranchbookResult<Option<T>> {
        Ok(self.select_as(table, filters)?.into_iter().next())
    }

    fn insert_as<T: Serialize + DeserializeOwned>(&self, table: &str, value: &T) -> BranchbookResult<T> {
        let row = self.insert(table, to_row(value)?)?;
        from_row(table, row)
    }
}

impl<S: DataStore + ?Sized> DataStoreExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_filter_matches() {
        let r = row(json!({"id": "a", "branch_id": "b1", "qty": 3}));
        assert!(Filter::eq("branch_id", "b1").matches(&r));
        assert!(Filter::eq("qty", 3).matches(&r));
        assert!(!Filter::eq("qty", 4).matches(&r));
        assert!(Filter::eq("missing", Value::Null).matches(&r));
    }

    #[test]
    fn test_matches_all_is_and() {
        let r = row(json!({"a": 1, "b": 2}));
        assert!(matches_all(&r, &[]));
        assert!(matches_all(&r, &[Filter::eq("a", 1), Filter::eq("b", 2)]));
        assert!(!matches_all(&r, &[Filter::eq("a", 1), Filter::eq("b", 3)]));
    }

    #[test]
    fn test_response_envelope() {
        let ok = ProcedureResponse::success("done", Some(json!({"n": 1})));
        assert!(ok.is_success());
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");

        let err: ProcedureResponse =
            serde_json::from_str(r#"{"status": "error", "message": "audit already reviewed"}"#).unwrap();
        assert!(!err.is_success());
        assert!(err.data.is_none());
    }

    #[test]
    fn test_to_row_rejects_scalars() {
        assert!(to_row(&5).is_err());
        assert!(to_row(&json!({"a": 1})).is_ok());
    }
}
