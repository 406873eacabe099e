//! CSV export of transaction records
//!
//! One row per record with branch and warehouse names resolved. Line items
//! are flattened into a `name x qty` list.

use std::collections::HashMap;
use std::io::Write;

use crate::error::{BranchbookError, BranchbookResult};
use crate::models::RecordKind;
use crate::reports::{filter, FilterCriteria, UNKNOWN_BRANCH};
use crate::services::{BranchService, RecordService, WarehouseService};
use crate::storage::DataStore;

/// Export records of the given kinds (all kinds when empty) that match
/// `criteria`. Returns the number of rows written.
pub fn export_records_csv<W: Write>(
    store: &dyn DataStore,
    kinds: &[RecordKind],
    criteria: &FilterCriteria,
    writer: &mut W,
) -> BranchbookResult<usize> {
    let records = RecordService::new(store);
    let branch_names = BranchService::new(store).names()?;
    let warehouse_names: HashMap<_, _> = WarehouseService::new(store)
        .list()?
        .into_iter()
        .map(|w| (w.id, w.name))
        .collect();

    let kinds = if kinds.is_empty() { RecordKind::all() } else { kinds };

    let mut csv = ::csv::Writer::from_writer(writer);
    csv.write_record([
        "ID", "Kind", "Date", "Branch", "Warehouse", "Reference", "Party", "Amount", "Items", "Note",
    ])
    .map_err(|e| BranchbookError::Export(e.to_string()))?;

    let mut written = 0;
    for kind in kinds {
        for record in filter(&records.list(*kind)?, criteria) {
            let branch = record
                .branch_id
                .and_then(|id| branch_names.get(&id).cloned())
                .unwrap_or_else(|| UNKNOWN_BRANCH.to_string());
            let warehouse = record
                .warehouse_id
                .and_then(|id| warehouse_names.get(&id).cloned())
                .unwrap_or_default();
            let items = record
                .items
                .iter()
                .map(|i| format!("{} x {}", i.product_name, i.quantity))
                .collect::<Vec<_>>()
                .join("; ");

            csv.write_record([
                record.id.to_full_string(),
                kind.table().to_string(),
                record.date.clone(),
                branch,
                warehouse,
                record.reference.clone(),
                record.party.clone(),
                format!("{:.2}", record.amount.as_f64()),
                items,
                record.note.clone(),
            ])
            .map_err(|e| BranchbookError::Export(e.to_string()))?;
            written += 1;
        }
    }

    csv.flush()
        .map_err(|e| BranchbookError::Export(e.to_string()))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BranchbookPaths;
    use crate::models::{LineItem, Money, ProductId, TransactionRecord};
    use crate::storage::JsonStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_export_records_csv() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = JsonStore::open(paths).unwrap();

        let branch = BranchService::new(&store).create("Harbour", None).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let mut sale = TransactionRecord::new(RecordKind::Sale, date, Money::from_cents(600))
            .with_branch(branch.id);
        sale.party = "Smith, J".into();
        sale.items = vec![LineItem::new(ProductId::new(), "Mug", 2, Money::from_cents(300))];

        let records = RecordService::new(&store);
        records.create(sale).unwrap();
        records
            .create(TransactionRecord::new(RecordKind::Expense, date, Money::from_cents(50)))
            .unwrap();

        let mut out = Vec::new();
        let written =
            export_records_csv(&store, &[RecordKind::Sale], &FilterCriteria::new(), &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();

        assert_eq!(written, 1);
        assert!(csv.starts_with("ID,Kind,Date,Branch"));
        assert!(csv.contains(",sales,2025-06-01,Harbour,,,\"Smith, J\",6.00,Mug x 2,"));

        let mut all = Vec::new();
        let written = export_records_csv(&store, &[], &FilterCriteria::new(), &mut all).unwrap();
        assert_eq!(written, 2);
        assert!(String::from_utf8(all).unwrap().contains("Unknown Branch"));
    }
}
