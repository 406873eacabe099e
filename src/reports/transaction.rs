//! Transaction Report
//!
//! Totals one record kind (sales, external sales, purchases or expenses)
//! over a filtered period, broken down by branch and by time bucket.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::display::report::{format_bar, separator, truncate};
use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{BranchId, BucketSize, RecordKind, TransactionRecord};
use crate::services::{BranchService, RecordService};
use crate::storage::DataStore;

use super::aggregator::{
    filter, group_by_branch, group_by_time_bucket, summarize, BranchTotal, BucketTotal,
    FilterCriteria, Summary,
};

/// Report over one record kind
#[derive(Debug, Clone, Serialize)]
pub struct TransactionReport {
    pub kind: RecordKind,
    /// Date range the report covers, as text
    pub period: String,
    pub bucket: BucketSize,
    pub summary: Summary,
    pub by_branch: Vec<BranchTotal>,
    pub series: Vec<BucketTotal>,
    /// The filtered records, in store order
    #[serde(skip)]
    pub records: Vec<TransactionRecord>,
}

impl TransactionReport {
    /// Fetch the table for `kind` and aggregate it
    pub fn generate(
        store: &dyn DataStore,
        kind: RecordKind,
        criteria: &FilterCriteria,
        bucket: BucketSize,
    ) -> BranchbookResult<Self> {
        let records = RecordService::new(store).list(kind)?;
        let branches = BranchService::new(store).names()?;
        Ok(Self::from_records(kind, &records, &branches, criteria, bucket))
    }

    /// Aggregate already-fetched records
    pub fn from_records(
        kind: RecordKind,
        records: &[TransactionRecord],
        branches: &HashMap<BranchId, String>,
        criteria: &FilterCriteria,
        bucket: BucketSize,
    ) -> Self {
        let records = filter(records, criteria);

        Self {
            kind,
            period: criteria.date_range_label(),
            bucket,
            summary: summarize(&records),
            by_branch: group_by_branch(&records, branches),
            series: group_by_time_bucket(&records, bucket),
            records,
        }
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("{} Report: {}\n", self.kind, self.period));
        output.push_str(&"=".repeat(70));
        output.push('\n');
        output.push_str(&format!("Total: {}\n", self.summary.total));
        output.push_str(&format!("Records: {}\n\n", self.summary.count));

        if self.summary.count == 0 {
            output.push_str("No records match the current filters.\n");
            return output;
        }

        output.push_str("BY BRANCH\n");
        output.push_str(&separator(70));
        output.push('\n');
        let max_branch = self
            .by_branch
            .iter()
            .map(|b| b.total.as_f64())
            .fold(0.0, f64::max);
        for branch in &self.by_branch {
            output.push_str(&format!(
                "{:<24} {:>14} {:>6}  {}\n",
                truncate(&branch.branch_name, 24),
                branch.total,
                branch.count,
                format_bar(branch.total.as_f64(), max_branch, 20)
            ));
        }

        output.push_str(&format!("\nBY {}\n", self.bucket.to_string().to_uppercase()));
        output.push_str(&separator(70));
        output.push('\n');
        let max_bucket = self
            .series
            .iter()
            .map(|b| b.total.as_f64())
            .fold(0.0, f64::max);
        for bucket in &self.series {
            output.push_str(&format!(
                "{:<24} {:>14} {:>6}  {}\n",
                bucket.label,
                bucket.total,
                bucket.count,
                format_bar(bucket.total.as_f64(), max_bucket, 20)
            ));
        }

        let undated = self.summary.count - self.series.iter().map(|b| b.count).sum::<usize>();
        if undated > 0 {
            output.push_str(&format!(
                "\n{} record(s) with an unreadable date are included in the total only.\n",
                undated
            ));
        }

        output
    }

    /// Export the branch and bucket totals to CSV
    pub fn export_csv<W: Write>(&self, writer: &mut W) -> BranchbookResult<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut rows: Vec<[String; 4]> = Vec::new();
        for branch in &self.by_branch {
            rows.push([
                "branch".to_string(),
                branch.branch_name.clone(),
                format!("{:.2}", branch.total.as_f64()),
                branch.count.to_string(),
            ]);
        }
        for bucket in &self.series {
            rows.push([
                self.bucket.to_string(),
                bucket.label.clone(),
                format!("{:.2}", bucket.total.as_f64()),
                bucket.count.to_string(),
            ]);
        }
        rows.push([
            "total".to_string(),
            String::new(),
            format!("{:.2}", self.summary.total.as_f64()),
            self.summary.count.to_string(),
        ]);

        csv.write_record(["Section", "Key", "Total", "Count"])
            .map_err(|e| BranchbookError::Export(e.to_string()))?;
        for row in &rows {
            csv.write_record(row)
                .map_err(|e| BranchbookError::Export(e.to_string()))?;
        }

        csv.flush()
            .map_err(|e| BranchbookError::Export(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BranchbookPaths;
    use crate::models::Money;
    use crate::storage::JsonStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_report() -> TransactionReport {
        let downtown = BranchId::new();
        let branches = HashMap::from([(downtown, "Downtown, East".to_string())]);

        let records = vec![
            TransactionRecord::new(RecordKind::Sale, date(2025, 1, 5), Money::from_cents(1000))
                .with_branch(downtown),
            TransactionRecord::new(RecordKind::Sale, date(2025, 1, 6), Money::from_cents(500)),
            TransactionRecord::with_raw_date(RecordKind::Sale, "??", Money::from_cents(25)),
        ];

        TransactionReport::from_records(
            RecordKind::Sale,
            &records,
            &branches,
            &FilterCriteria::new(),
            BucketSize::Month,
        )
    }

    #[test]
    fn test_from_records() {
        let report = sample_report();
        assert_eq!(report.summary.total, Money::from_cents(1525));
        assert_eq!(report.summary.count, 3);
        assert_eq!(report.by_branch[0].branch_name, "Downtown, East");
        assert_eq!(report.series.len(), 1);
        assert_eq!(report.series[0].label, "2025-01");
        assert_eq!(report.period, "all dates");
    }

    #[test]
    fn test_format_terminal() {
        let output = sample_report().format_terminal();
        assert!(output.contains("Sale Report: all dates"));
        assert!(output.contains("Total: $15.25"));
        assert!(output.contains("BY MONTH"));
        assert!(output.contains("1 record(s) with an unreadable date"));
    }

    #[test]
    fn test_export_csv_quotes_names() {
        let mut out = Vec::new();
        sample_report().export_csv(&mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();

        assert!(csv.starts_with("Section,Key,Total,Count\n"));
        assert!(csv.contains("branch,\"Downtown, East\",10.00,1"));
        assert!(csv.contains("month,2025-01,15.00,2"));
        assert!(csv.contains("total,,15.25,3"));
    }

    #[test]
    fn test_generate_from_store() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = JsonStore::open(paths).unwrap();

        let branch = BranchService::new(&store).create("North", None).unwrap();
        let records = RecordService::new(&store);
        records
            .create(
                TransactionRecord::new(RecordKind::Expense, date(2025, 3, 2), Money::from_cents(900))
                    .with_branch(branch.id),
            )
            .unwrap();
        records
            .create(TransactionRecord::new(RecordKind::Expense, date(2025, 4, 2), Money::from_cents(100)))
            .unwrap();

        let march = FilterCriteria::between(date(2025, 3, 1), date(2025, 3, 31));
        let report =
            TransactionReport::generate(&store, RecordKind::Expense, &march, BucketSize::Day).unwrap();

        assert_eq!(report.summary.total, Money::from_cents(900));
        assert_eq!(report.by_branch[0].branch_name, "North");
        assert_eq!(report.period, "2025-03-01 to 2025-03-31");
    }

    #[test]
    fn test_empty_report() {
        let report = TransactionReport::from_records(
            RecordKind::Purchase,
            &[],
            &HashMap::new(),
            &FilterCriteria::new(),
            BucketSize::Day,
        );
        assert!(report.format_terminal().contains("No records match"));
    }
}
