//! Record service
//!
//! Create, list and delete transaction records. Sales and purchases that
//! move stock go through `ProcedureService`; this service writes the record
//! alone (expenses, or historical rows imported by hand).

use tracing::{debug, info};

use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{RecordId, RecordKind, TransactionRecord};
use crate::storage::{DataStore, DataStoreExt, Filter};

use super::branch::BranchService;
use super::fetch::{RequestTracker, Snapshot};
use super::warehouse::WarehouseService;

/// Service for transaction records
pub struct RecordService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> RecordService<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Validate and insert a record into the table for its kind
    pub fn create(&self, record: TransactionRecord) -> BranchbookResult<TransactionRecord> {
        record
            .validate()
            .map_err(|e| BranchbookError::Validation(e.to_string()))?;

        if let Some(branch_id) = record.branch_id {
            if BranchService::new(self.store).get(branch_id)?.is_none() {
                return Err(BranchbookError::branch_not_found(branch_id.to_string()));
            }
        }

        if let Some(warehouse_id) = record.warehouse_id {
            if WarehouseService::new(self.store).get(warehouse_id)?.is_none() {
                return Err(BranchbookError::warehouse_not_found(warehouse_id.to_string()));
            }
        }

        let record = self.store.insert_as(record.kind.table(), &record)?;
        info!(kind = %record.kind, id = %record.id, amount = %record.amount, "recorded transaction");
        Ok(record)
    }

    /// All records of one kind, in insertion order
    pub fn list(&self, kind: RecordKind) -> BranchbookResult<Vec<TransactionRecord>> {
        self.store.select_as(kind.table(), &[])
    }

    /// Records of every kind
    pub fn list_all(&self) -> BranchbookResult<Vec<TransactionRecord>> {
        let mut all = Vec::new();
        for kind in RecordKind::all() {
            all.extend(self.list(*kind)?);
        }
        Ok(all)
    }

    pub fn get(&self, kind: RecordKind, id: RecordId) -> BranchbookResult<Option<TransactionRecord>> {
        self.store.find_as(kind.table(), &[Filter::eq("id", id)])
    }

    /// Delete one record. Stock moved by the record is not restored.
    pub fn delete(&self, kind: RecordKind, id: RecordId) -> BranchbookResult<()> {
        self.store
            .delete(kind.table(), &[Filter::eq("id", id)])
            .map_err(|e| {
                if e.is_not_found() {
                    BranchbookError::NotFound {
                        entity_type: "Record",
                        identifier: id.to_string(),
                    }
                } else {
                    e
                }
            })?;
        info!(kind = %kind, id = %id, "deleted record");
        Ok(())
    }

    /// Fetch one kind into `snapshot`, dropping the result if a newer fetch
    /// was started meanwhile. Returns whether the snapshot was updated.
    pub fn fetch(
        &self,
        kind: RecordKind,
        tracker: &RequestTracker,
        snapshot: &mut Snapshot<TransactionRecord>,
    ) -> BranchbookResult<bool> {
        let token = tracker.issue();
        debug!(kind = %kind, token = token.seq(), "fetching records");
        let records = self.list(kind)?;
        Ok(snapshot.apply(&token, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BranchbookPaths;
    use crate::models::{BranchId, Money};
    use crate::storage::JsonStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, JsonStore) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());
        (temp_dir, JsonStore::open(paths).unwrap())
    }

    fn expense(cents: i64) -> TransactionRecord {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        TransactionRecord::new(RecordKind::Expense, date, Money::from_cents(cents))
    }

    #[test]
    fn test_create_list_delete() {
        let (_temp, store) = create_test_store();
        let service = RecordService::new(&store);

        let rec = service.create(expense(1200)).unwrap();
        service.create(expense(300)).unwrap();

        assert_eq!(service.list(RecordKind::Expense).unwrap().len(), 2);
        assert!(service.list(RecordKind::Sale).unwrap().is_empty());
        assert_eq!(service.list_all().unwrap().len(), 2);

        service.delete(RecordKind::Expense, rec.id).unwrap();
        assert!(service.get(RecordKind::Expense, rec.id).unwrap().is_none());
        assert!(service.delete(RecordKind::Expense, rec.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_row_with_null_date_still_lists() {
        let (_temp, store) = create_test_store();
        let service = RecordService::new(&store);
        service.create(expense(1200)).unwrap();

        let row = match serde_json::json!({"kind": "expense", "date": null, "amount": 300}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        store.insert(RecordKind::Expense.table(), row).unwrap();

        let records = service.list(RecordKind::Expense).unwrap();
        assert_eq!(records.len(), 2);

        let summary = crate::reports::summarize(&records);
        assert_eq!(summary.total, Money::from_cents(1500));
        assert_eq!(summary.count, 2);

        let buckets = crate::reports::group_by_time_bucket(&records, crate::models::BucketSize::Month);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total, Money::from_cents(1200));
    }

    #[test]
    fn test_invalid_record_not_written() {
        let (_temp, store) = create_test_store();
        let service = RecordService::new(&store);

        let bad = TransactionRecord::with_raw_date(RecordKind::Expense, "13/45/2025", Money::from_cents(1));
        assert!(service.create(bad).unwrap_err().is_validation());

        let orphan = expense(100).with_branch(BranchId::new());
        assert!(service.create(orphan).unwrap_err().is_not_found());

        assert!(service.list(RecordKind::Expense).unwrap().is_empty());
    }

    #[test]
    fn test_fetch_fills_snapshot() {
        let (_temp, store) = create_test_store();
        let service = RecordService::new(&store);
        service.create(expense(500)).unwrap();

        let tracker = RequestTracker::new();
        let mut snapshot = Snapshot::new();
        assert!(service.fetch(RecordKind::Expense, &tracker, &mut snapshot).unwrap());
        assert_eq!(snapshot.items().len(), 1);
    }

    #[test]
    fn test_fetch_superseded_by_newer_request() {
        let (_temp, store) = create_test_store();
        let service = RecordService::new(&store);
        service.create(expense(500)).unwrap();

        let tracker = RequestTracker::new();
        let mut snapshot = Snapshot::new();
        service.fetch(RecordKind::Expense, &tracker, &mut snapshot).unwrap();

        // A request started elsewhere after this one completes wins
        let newer = tracker.issue();
        assert!(snapshot.apply(&newer, Vec::new()));
        assert!(snapshot.items().is_empty());
    }
}
