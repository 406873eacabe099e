//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of writes that are audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Update,
    Delete,
    /// A business procedure ran (stock audit review, purchase, sale)
    Call,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Insert => write!(f, "INSERT"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Call => write!(f, "CALL"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the write was committed (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    /// Table name, or procedure name for `Call`
    pub target: String,

    /// `id` of the affected row, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
}

fn row_id_of(row: &serde_json::Value) -> Option<String> {
    row.get("id").and_then(|v| v.as_str()).map(str::to_string)
}

impl AuditEntry {
    pub fn insert(table: impl Into<String>, row: &serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Insert,
            target: table.into(),
            row_id: row_id_of(row),
            before: None,
            after: Some(row.clone()),
        }
    }

    pub fn update(
        table: impl Into<String>,
        before: &serde_json::Value,
        after: &serde_json::Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Update,
            target: table.into(),
            row_id: row_id_of(after),
            before: Some(before.clone()),
            after: Some(after.clone()),
        }
    }

    pub fn delete(table: impl Into<String>, row: &serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Delete,
            target: table.into(),
            row_id: row_id_of(row),
            before: Some(row.clone()),
            after: None,
        }
    }

    /// A procedure call with its arguments and the response data
    pub fn call(
        procedure: impl Into<String>,
        args: &serde_json::Value,
        result: Option<&serde_json::Value>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Call,
            target: procedure.into(),
            row_id: None,
            before: Some(args.clone()),
            after: result.cloned(),
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.target
        );

        if let Some(id) = &self.row_id {
            output.push_str(&format!(" {}", id));
        }

        output
    }
}
