//! CLI commands for reports
//!
//! Every report takes the shared filter flags (or `--view`) and prints to
//! the terminal, or writes CSV/JSON/YAML with `--output`.

use std::path::PathBuf;

use clap::Subcommand;

use crate::config::Settings;
use crate::error::{BranchbookError, BranchbookResult};
use crate::export::ExportFormat;
use crate::models::BucketSize;
use crate::reports::{DashboardSummary, StockValuationReport, TransactionReport};
use crate::storage::DataStore;

use super::filters::{write_report_file, FilterArgs};
use super::record::parse_kind;

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Total and count of one record kind
    Summary {
        /// Kind: sale, external-sale, purchase or expense
        #[arg(default_value = "sale")]
        kind: String,
        #[command(flatten)]
        filters: FilterArgs,
        /// Export to a file instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Export format (csv, json, yaml); defaults to the file extension
        #[arg(long)]
        format: Option<String>,
    },
    /// Totals per branch, largest first
    #[command(alias = "by-branch")]
    Branches {
        #[arg(default_value = "sale")]
        kind: String,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        format: Option<String>,
    },
    /// Totals per day, week or month
    Series {
        #[arg(default_value = "sale")]
        kind: String,
        /// Bucket size: day, week or month (defaults to the setting)
        #[arg(short, long)]
        bucket: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        format: Option<String>,
    },
    /// Stock value per warehouse and low-stock products
    Stock {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        format: Option<String>,
    },
    /// Headline figures: revenue, costs, gross profit and stock
    Dashboard {
        #[arg(short, long)]
        bucket: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        format: Option<String>,
    },
}

fn parse_bucket(bucket: Option<&str>, settings: &Settings) -> BranchbookResult<BucketSize> {
    match bucket {
        Some(b) => b
            .parse::<BucketSize>()
            .map_err(|e| BranchbookError::Validation(e.to_string())),
        None => Ok(settings.default_bucket),
    }
}

fn parse_format(format: Option<&str>) -> BranchbookResult<Option<ExportFormat>> {
    format.map(str::parse).transpose()
}

/// Which section of a transaction report to print
enum Section {
    Summary,
    Branches,
    Series,
}

fn print_section(report: &TransactionReport, section: Section) {
    match section {
        Section::Summary => {
            println!("{} ({})", report.kind, report.period);
            println!("  Total:   {}", report.summary.total);
            println!("  Records: {}", report.summary.count);
        }
        Section::Branches => {
            println!("{} by branch ({})", report.kind, report.period);
            for branch in &report.by_branch {
                println!("  {:<28} {:>14} {:>6}", branch.branch_name, branch.total, branch.count);
            }
            if report.by_branch.is_empty() {
                println!("  No records match the current filters.");
            }
        }
        Section::Series => print!("{}", report.format_terminal()),
    }
}

/// Handle report commands
pub fn handle_report_command(store: &dyn DataStore, settings: &Settings, cmd: ReportCommands) -> BranchbookResult<()> {
    let (kind, bucket, filters, output, format, section) = match cmd {
        ReportCommands::Stock {
            filters,
            output,
            format,
        } => {
            let criteria = filters.criteria(store, settings)?;
            let report = StockValuationReport::generate(store, &criteria, settings.low_stock_default)?;
            match output {
                Some(path) => write_report_file(&report, &path, parse_format(format.as_deref())?)?,
                None => print!("{}", report.format_terminal()),
            }
            return Ok(());
        }
        ReportCommands::Dashboard {
            bucket,
            filters,
            output,
            format,
        } => {
            let criteria = filters.criteria(store, settings)?;
            let bucket = parse_bucket(bucket.as_deref(), settings)?;
            let report = DashboardSummary::generate(store, &criteria, bucket, settings.low_stock_default)?;
            match output {
                Some(path) => write_report_file(&report, &path, parse_format(format.as_deref())?)?,
                None => print!("{}", report.format_terminal()),
            }
            return Ok(());
        }
        ReportCommands::Summary {
            kind,
            filters,
            output,
            format,
        } => (kind, None, filters, output, format, Section::Summary),
        ReportCommands::Branches {
            kind,
            filters,
            output,
            format,
        } => (kind, None, filters, output, format, Section::Branches),
        ReportCommands::Series {
            kind,
            bucket,
            filters,
            output,
            format,
        } => (kind, bucket, filters, output, format, Section::Series),
    };

    let kind = parse_kind(&kind)?;
    let bucket = parse_bucket(bucket.as_deref(), settings)?;
    let criteria = filters.criteria(store, settings)?;
    let report = TransactionReport::generate(store, kind, &criteria, bucket)?;

    match output {
        Some(path) => write_report_file(&report, &path, parse_format(format.as_deref())?),
        None => {
            print_section(&report, section);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_default() {
        let settings = Settings {
            default_bucket: BucketSize::Week,
            ..Settings::default()
        };
        assert_eq!(parse_bucket(None, &settings).unwrap(), BucketSize::Week);
        assert_eq!(parse_bucket(Some("monthly"), &settings).unwrap(), BucketSize::Month);
        assert!(parse_bucket(Some("hourly"), &settings).unwrap_err().is_validation());
    }
}
