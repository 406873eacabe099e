//! Export module for branchbook
//!
//! Reports go out as CSV (spreadsheet), JSON or YAML. The whole data store
//! can also be dumped to JSON or YAML as one snapshot.

pub mod csv;
pub mod json;
pub mod yaml;

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{BranchbookError, BranchbookResult};
use crate::reports::{DashboardSummary, StockValuationReport, TransactionReport};

pub use self::csv::export_records_csv;
pub use json::{export_full_json, import_from_json, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_full_yaml, import_from_yaml};

/// Output format for reports and snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Yaml,
}

impl ExportFormat {
    /// Guess the format from a file extension, defaulting to CSV
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = BranchbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(BranchbookError::Validation(format!(
                "Unknown export format '{}': expected csv, json or yaml",
                other
            ))),
        }
    }
}

/// A report with a CSV rendering
pub trait CsvReport {
    fn write_csv<W: Write>(&self, writer: &mut W) -> BranchbookResult<()>;
}

impl CsvReport for TransactionReport {
    fn write_csv<W: Write>(&self, writer: &mut W) -> BranchbookResult<()> {
        self.export_csv(writer)
    }
}

impl CsvReport for StockValuationReport {
    fn write_csv<W: Write>(&self, writer: &mut W) -> BranchbookResult<()> {
        self.export_csv(writer)
    }
}

impl CsvReport for DashboardSummary {
    fn write_csv<W: Write>(&self, writer: &mut W) -> BranchbookResult<()> {
        self.export_csv(writer)
    }
}

/// Write a report in the chosen format
pub fn write_report<R, W>(report: &R, format: ExportFormat, writer: &mut W) -> BranchbookResult<()>
where
    R: CsvReport + Serialize,
    W: Write,
{
    match format {
        ExportFormat::Csv => report.write_csv(writer),
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, report)
                .map_err(|e| BranchbookError::Export(e.to_string()))?;
            writeln!(writer).map_err(|e| BranchbookError::Export(e.to_string()))
        }
        ExportFormat::Yaml => serde_yaml::to_writer(writer, report)
            .map_err(|e| BranchbookError::Export(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BucketSize, Money, RecordKind, TransactionRecord};
    use crate::reports::FilterCriteria;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn report() -> TransactionReport {
        let records = vec![TransactionRecord::new(
            RecordKind::Expense,
            NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            Money::from_cents(4200),
        )];
        TransactionReport::from_records(
            RecordKind::Expense,
            &records,
            &HashMap::new(),
            &FilterCriteria::new(),
            BucketSize::Month,
        )
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.yml")), ExportFormat::Yaml);
        assert_eq!(ExportFormat::from_path(Path::new("out.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_write_report_formats() {
        let report = report();

        let mut json = Vec::new();
        write_report(&report, ExportFormat::Json, &mut json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["summary"]["total"], 4200);
        assert_eq!(value["series"][0]["label"], "2025-02");

        let mut yaml = Vec::new();
        write_report(&report, ExportFormat::Yaml, &mut yaml).unwrap();
        assert!(String::from_utf8(yaml).unwrap().contains("kind: expense"));

        let mut csv = Vec::new();
        write_report(&report, ExportFormat::Csv, &mut csv).unwrap();
        assert!(String::from_utf8(csv).unwrap().contains("total,,42.00,1"));
    }
}
