//! Transaction record CLI commands

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use chrono::Local;
use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_record_details, format_record_page};
use crate::error::{BranchbookError, BranchbookResult};
use crate::export::export_records_csv;
use crate::models::{Money, RecordKind, TransactionRecord};
use crate::reports::filter;
use crate::services::{BranchService, CatalogService, RecordService, RequestTracker, Snapshot, WarehouseService};
use crate::storage::DataStore;

use super::filters::FilterArgs;
use super::match_id;
use super::stock::parse_user;

/// Record subcommands
#[derive(Subcommand)]
pub enum RecordCommands {
    /// Add a record without stock movement (typically an expense)
    Add {
        /// Kind: sale, external-sale, purchase or expense
        kind: String,
        /// Amount (e.g., "45.00")
        amount: String,
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Branch name or ID
        #[arg(short, long)]
        branch: Option<String>,
        /// Warehouse name or ID
        #[arg(short, long)]
        warehouse: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Customer or supplier
        #[arg(short, long)]
        party: Option<String>,
        /// Invoice or receipt number
        #[arg(short, long)]
        reference: Option<String>,
        /// Free-form note
        #[arg(short, long)]
        note: Option<String>,
        /// Recording user ID
        #[arg(long)]
        user: Option<String>,
    },
    /// List records, one page at a time
    List {
        /// Only this kind
        kind: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Page number
        #[arg(long)]
        page: Option<usize>,
        /// Records per page
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show a record with its line items
    Show {
        /// Record ID (full or short form)
        id: String,
    },
    /// Delete a record (stock is not restored)
    Delete {
        /// Record ID (full or short form)
        id: String,
    },
    /// Export matching records to CSV
    Export {
        /// Output file
        output: PathBuf,
        /// Only this kind
        #[arg(short, long)]
        kind: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

pub(crate) fn parse_kind(kind: &str) -> BranchbookResult<RecordKind> {
    kind.parse().map_err(BranchbookError::Validation)
}

fn find_record(records: &RecordService<'_>, id: &str) -> BranchbookResult<TransactionRecord> {
    let all = records.list_all()?;
    Ok(match_id(&all, id, "rec-", |r| r.id.to_full_string(), "Record")?.clone())
}

/// Handle a record command
pub fn handle_record_command(store: &dyn DataStore, settings: &Settings, cmd: RecordCommands) -> BranchbookResult<()> {
    let records = RecordService::new(store);

    match cmd {
        RecordCommands::Add {
            kind,
            amount,
            date,
            branch,
            warehouse,
            category,
            party,
            reference,
            note,
            user,
        } => {
            let kind = parse_kind(&kind)?;
            let amount = Money::parse(&amount).map_err(|e| {
                BranchbookError::Validation(format!("Invalid amount '{}': {}", amount, e))
            })?;
            let date = date.unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());

            let mut record = TransactionRecord::with_raw_date(kind, date, amount);
            if let Some(w) = warehouse {
                let warehouse = WarehouseService::new(store).resolve(&w)?;
                record.warehouse_id = Some(warehouse.id);
                record.branch_id = warehouse.branch_id;
            }
            if let Some(b) = branch {
                record.branch_id = Some(BranchService::new(store).resolve(&b)?.id);
            }
            record.category_id = category
                .map(|c| CatalogService::new(store).resolve_category(&c))
                .transpose()?
                .map(|c| c.id);
            record.party = party.unwrap_or_default();
            record.reference = reference.unwrap_or_default();
            record.note = note.unwrap_or_default();
            record.user_id = parse_user(user)?;

            let record = records.create(record)?;
            println!("Recorded {} of {} on {}", record.kind, record.amount, record.date);
            println!("  ID: {}", record.id);
        }

        RecordCommands::List {
            kind,
            filters,
            page,
            limit,
        } => {
            let mut view = filters.view_state(settings);
            if let Some(limit) = limit {
                view = view.with_limit(limit);
            }
            if let Some(page) = page {
                view = view.with_page(page);
            }
            let criteria = filters.criteria(store, settings)?;

            let all = match kind {
                Some(k) => {
                    let tracker = RequestTracker::new();
                    let mut snapshot = Snapshot::new();
                    records.fetch(parse_kind(&k)?, &tracker, &mut snapshot)?;
                    snapshot.items().to_vec()
                }
                None => records.list_all()?,
            };

            let matching = filter(&all, &criteria);
            let page = view.paginate(&matching);
            println!("{}", format_record_page(&page, &BranchService::new(store).names()?));
        }

        RecordCommands::Show { id } => {
            print!("{}", format_record_details(&find_record(&records, &id)?));
        }

        RecordCommands::Delete { id } => {
            let record = find_record(&records, &id)?;
            records.delete(record.kind, record.id)?;
            println!("Deleted {} {} ({})", record.kind, record.id, record.amount);
        }

        RecordCommands::Export { output, kind, filters } => {
            let kinds: Vec<RecordKind> = kind.as_deref().map(parse_kind).transpose()?.into_iter().collect();
            let criteria = filters.criteria(store, settings)?;

            let file = File::create(&output).map_err(|e| {
                BranchbookError::Export(format!("Failed to create file {}: {}", output.display(), e))
            })?;
            let mut writer = BufWriter::new(file);
            let count = export_records_csv(store, &kinds, &criteria, &mut writer)?;
            println!("Exported {} records to: {}", count, output.display());
        }
    }

    Ok(())
}
