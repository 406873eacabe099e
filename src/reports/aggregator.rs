//! Report aggregation
//!
//! Pure functions over record snapshots: filter by criteria, total, group by
//! branch and group into time buckets. None of them fail or touch storage;
//! callers fetch the rows first and hand over a slice.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::models::{
    BranchId, BucketSize, CategoryId, Money, StockRecord, TransactionRecord, UserId, WarehouseId,
};

/// Name of the bucket collecting rows without a known branch
pub const UNKNOWN_BRANCH: &str = "Unknown Branch";

/// A row the aggregator can filter and total
pub trait ReportRow {
    /// Date used for range filters and time buckets, `None` if malformed
    fn date(&self) -> Option<NaiveDate>;

    /// The stored date text, for diagnostics
    fn raw_date(&self) -> String;

    fn amount(&self) -> Money;

    fn branch_id(&self) -> Option<BranchId>;

    fn warehouse_id(&self) -> Option<WarehouseId> {
        None
    }

    fn category_id(&self) -> Option<CategoryId> {
        None
    }

    fn user_id(&self) -> Option<UserId> {
        None
    }

    /// Text matched by the free-text query
    fn search_fields(&self) -> Vec<&str>;
}

impl ReportRow for TransactionRecord {
    fn date(&self) -> Option<NaiveDate> {
        self.parsed_date()
    }

    fn raw_date(&self) -> String {
        self.date.clone()
    }

    fn amount(&self) -> Money {
        self.amount
    }

    fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.reference.as_str(), self.party.as_str(), self.note.as_str()];
        fields.extend(self.items.iter().map(|i| i.product_name.as_str()));
        fields
    }
}

impl ReportRow for StockRecord {
    fn date(&self) -> Option<NaiveDate> {
        Some(self.updated_at.date_naive())
    }

    fn raw_date(&self) -> String {
        self.updated_at.to_rfc3339()
    }

    /// Stock value at purchase price
    fn amount(&self) -> Money {
        self.value()
    }

    fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    fn warehouse_id(&self) -> Option<WarehouseId> {
        Some(self.warehouse_id)
    }

    fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.product_name.as_str()]
    }
}

/// Conditions a row must meet, combined with AND. `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Inclusive lower date bound
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper date bound
    pub date_to: Option<NaiveDate>,
    pub branch_id: Option<BranchId>,
    pub category_id: Option<CategoryId>,
    pub user_id: Option<UserId>,
    pub warehouse_id: Option<WarehouseId>,
    /// Case-insensitive substring over the row's search fields
    pub query: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        Self {
            date_from: Some(date_from),
            date_to: Some(date_to),
            ..Self::default()
        }
    }

    pub fn with_branch(mut self, branch_id: BranchId) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn with_warehouse(mut self, warehouse_id: WarehouseId) -> Self {
        self.warehouse_id = Some(warehouse_id);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// True when `date_from` is after `date_to`
    pub fn is_inverted(&self) -> bool {
        matches!((self.date_from, self.date_to), (Some(from), Some(to)) if from > to)
    }

    pub fn has_date_bounds(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Human-readable date range, e.g. `2025-01-01 to 2025-01-31`
    pub fn date_range_label(&self) -> String {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => format!("{} to {}", from, to),
            (Some(from), None) => format!("from {}", from),
            (None, Some(to)) => format!("until {}", to),
            (None, None) => "all dates".to_string(),
        }
    }

    /// Whether one row meets every condition
    pub fn matches<R: ReportRow + ?Sized>(&self, row: &R) -> bool {
        if self.is_inverted() {
            return false;
        }

        if self.has_date_bounds() {
            let Some(date) = row.date() else {
                return false;
            };
            if self.date_from.is_some_and(|from| date < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| date > to) {
                return false;
            }
        }

        if self.branch_id.is_some() && row.branch_id() != self.branch_id {
            return false;
        }
        if self.category_id.is_some() && row.category_id() != self.category_id {
            return false;
        }
        if self.user_id.is_some() && row.user_id() != self.user_id {
            return false;
        }
        if self.warehouse_id.is_some() && row.warehouse_id() != self.warehouse_id {
            return false;
        }

        match self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            None => true,
            Some(query) => {
                let needle = query.to_lowercase();
                row.search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Total and count of a row set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: Money,
    pub count: usize,
}

impl Summary {
    fn add(&mut self, amount: Money) {
        self.total += amount;
        self.count += 1;
    }
}

/// Per-branch total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchTotal {
    /// `None` for the unknown-branch bucket
    pub branch_id: Option<BranchId>,
    pub branch_name: String,
    pub total: Money,
    pub count: usize,
}

/// Per-period total
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketTotal {
    pub label: String,
    pub total: Money,
    pub count: usize,
}

/// Rows meeting `criteria`, in input order
pub fn filter<R: ReportRow + Clone>(records: &[R], criteria: &FilterCriteria) -> Vec<R> {
    if criteria.is_inverted() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| criteria.matches(*r))
        .cloned()
        .collect()
}

/// Sum of amounts and row count
pub fn summarize<R: ReportRow>(records: &[R]) -> Summary {
    let mut summary = Summary::default();
    for record in records {
        summary.add(record.amount());
    }
    summary
}

/// Totals per branch, largest first. Rows with no branch, or a branch
/// missing from `branches`, are pooled under `UNKNOWN_BRANCH`. Ties keep
/// the order in which branches were first seen.
pub fn group_by_branch<R: ReportRow>(
    records: &[R],
    branches: &HashMap<BranchId, String>,
) -> Vec<BranchTotal> {
    let mut groups: Vec<BranchTotal> = Vec::new();
    let mut index: HashMap<Option<BranchId>, usize> = HashMap::new();

    for record in records {
        let key = record.branch_id().filter(|id| branches.contains_key(id));

        let slot = *index.entry(key).or_insert_with(|| {
            let branch_name = key
                .and_then(|id| branches.get(&id).cloned())
                .unwrap_or_else(|| UNKNOWN_BRANCH.to_string());
            groups.push(BranchTotal {
                branch_id: key,
                branch_name,
                total: Money::zero(),
                count: 0,
            });
            groups.len() - 1
        });

        groups[slot].total += record.amount();
        groups[slot].count += 1;
    }

    // sort_by is stable
    groups.sort_by(|a, b| b.total.cmp(&a.total));
    groups
}

/// Totals per time bucket, oldest first. Rows with a malformed date are
/// left out with a warning.
pub fn group_by_time_bucket<R: ReportRow>(records: &[R], bucket: BucketSize) -> Vec<BucketTotal> {
    let mut buckets: BTreeMap<String, Summary> = BTreeMap::new();

    for record in records {
        match record.date() {
            Some(date) => buckets.entry(bucket.label(date)).or_default().add(record.amount()),
            None => warn!(date = %record.raw_date(), "skipping row with malformed date"),
        }
    }

    buckets
        .into_iter()
        .map(|(label, s)| BucketTotal {
            label,
            total: s.total,
            count: s.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(raw_date: &str, cents: i64, branch: Option<BranchId>) -> TransactionRecord {
        let mut rec = TransactionRecord::with_raw_date(RecordKind::Sale, raw_date, Money::from_cents(cents));
        rec.branch_id = branch;
        rec
    }

    struct Example {
        a: BranchId,
        b: BranchId,
        branches: HashMap<BranchId, String>,
        records: Vec<TransactionRecord>,
    }

    fn example() -> Example {
        let a = BranchId::new();
        let b = BranchId::new();
        let branches = HashMap::from([(a, "A".to_string()), (b, "B".to_string())]);
        let records = vec![
            sale("2025-01-05", 100, Some(a)),
            sale("2025-01-20", 50, Some(b)),
            sale("2025-02-01", 75, Some(a)),
        ];
        Example {
            a,
            b,
            branches,
            records,
        }
    }

    #[test]
    fn test_january_example() {
        let ex = example();
        let january = FilterCriteria::between(date(2025, 1, 1), date(2025, 1, 31));

        let subset = filter(&ex.records, &january);
        assert_eq!(
            summarize(&subset),
            Summary {
                total: Money::from_cents(150),
                count: 2
            }
        );

        let by_branch = group_by_branch(&subset, &ex.branches);
        assert_eq!(by_branch.len(), 2);
        assert_eq!(by_branch[0].branch_id, Some(ex.a));
        assert_eq!(by_branch[0].branch_name, "A");
        assert_eq!(by_branch[0].total, Money::from_cents(100));
        assert_eq!(by_branch[1].branch_id, Some(ex.b));
        assert_eq!(by_branch[1].total, Money::from_cents(50));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let ex = example();
        let inverted = FilterCriteria::between(date(2025, 2, 1), date(2025, 1, 1));
        assert!(filter(&ex.records, &inverted).is_empty());
    }

    #[test]
    fn test_summarize_empty() {
        let none: Vec<TransactionRecord> = Vec::new();
        assert_eq!(summarize(&none), Summary::default());
        assert_eq!(summarize(&none).count, 0);
        assert!(summarize(&none).total.is_zero());
    }

    #[test]
    fn test_malformed_date_counts_in_total_not_buckets() {
        let records = vec![
            sale("2025-01-05", 100, None),
            sale("not a date", 40, None),
        ];

        let all = filter(&records, &FilterCriteria::new());
        assert_eq!(all.len(), 2);
        assert_eq!(summarize(&all).total, Money::from_cents(140));

        let buckets = group_by_time_bucket(&all, BucketSize::Day);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total, Money::from_cents(100));

        let bounded = FilterCriteria {
            date_from: Some(date(2020, 1, 1)),
            ..FilterCriteria::default()
        };
        assert_eq!(filter(&records, &bounded).len(), 1);
    }

    #[test]
    fn test_unknown_branch_bucket() {
        let ex = example();
        let stray = BranchId::new();
        let records = vec![
            sale("2025-01-01", 10, None),
            sale("2025-01-01", 20, Some(stray)),
            sale("2025-01-01", 5, Some(ex.a)),
        ];

        let groups = group_by_branch(&records, &ex.branches);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].branch_name, UNKNOWN_BRANCH);
        assert_eq!(groups[0].branch_id, None);
        assert_eq!(groups[0].total, Money::from_cents(30));
        assert_eq!(groups[0].count, 2);
    }

    #[test]
    fn test_equal_totals_keep_first_seen_order() {
        let ex = example();
        let records = vec![
            sale("2025-01-01", 50, Some(ex.b)),
            sale("2025-01-01", 50, Some(ex.a)),
        ];
        let groups = group_by_branch(&records, &ex.branches);
        assert_eq!(groups[0].branch_name, "B");
        assert_eq!(groups[1].branch_name, "A");
    }

    #[test]
    fn test_bucket_labels() {
        let records = vec![
            sale("2025-01-31", 1, None),
            sale("2024-12-30", 2, None),
            sale("2025-01-01T09:30:00Z", 4, None),
        ];

        let weeks = group_by_time_bucket(&records, BucketSize::Week);
        // 2024-12-30 and 2025-01-01 fall in ISO week 2025-W01
        assert_eq!(weeks[0].label, "2025-W01");
        assert_eq!(weeks[0].total, Money::from_cents(6));
        assert_eq!(weeks[1].label, "2025-W05");

        let months = group_by_time_bucket(&records, BucketSize::Month);
        let labels: Vec<_> = months.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-12", "2025-01"]);
    }

    #[test]
    fn test_dimension_and_query_filters() {
        let ex = example();
        let mut records = ex.records.clone();
        records[1].party = "Acme Wholesale".into();
        records[2].user_id = Some(UserId::new());

        let by_branch = filter(&records, &FilterCriteria::new().with_branch(ex.b));
        assert_eq!(by_branch.len(), 1);

        let by_query = filter(&records, &FilterCriteria::new().with_query("  acme "));
        assert_eq!(by_query.len(), 1);
        assert_eq!(by_query[0].id, records[1].id);

        let by_user = FilterCriteria {
            user_id: records[2].user_id,
            ..FilterCriteria::default()
        };
        assert_eq!(filter(&records, &by_user).len(), 1);

        let blank_query = FilterCriteria::new().with_query("   ");
        assert_eq!(filter(&records, &blank_query).len(), 3);
    }

    #[test]
    fn test_stock_rows_filter_by_warehouse() {
        let wh = WarehouseId::new();
        let stock = vec![
            StockRecord::new(crate::models::ProductId::new(), "Soap", wh, 4, Money::from_cents(100)),
            StockRecord::new(crate::models::ProductId::new(), "Towel", WarehouseId::new(), 1, Money::from_cents(500)),
        ];

        let subset = filter(&stock, &FilterCriteria::new().with_warehouse(wh));
        assert_eq!(subset.len(), 1);
        assert_eq!(summarize(&subset).total, Money::from_cents(400));
    }

    fn arb_raw_date() -> impl Strategy<Value = String> {
        prop_oneof![
            8 => (2023i32..2026, 1u32..13, 1u32..29)
                .prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d)),
            1 => Just("garbage".to_string()),
            1 => Just(String::new()),
        ]
    }

    fn arb_records(branches: Vec<BranchId>) -> impl Strategy<Value = Vec<TransactionRecord>> {
        let branch_count = branches.len();
        prop::collection::vec(
            (arb_raw_date(), -10_000i64..1_000_000, 0..branch_count + 2),
            0..40,
        )
        .prop_map(move |rows| {
            rows.into_iter()
                .map(|(raw, cents, pick)| {
                    let branch = match pick {
                        i if i < branch_count => Some(branches[i]),
                        i if i == branch_count => None,
                        _ => Some(BranchId::new()),
                    };
                    sale(&raw, cents, branch)
                })
                .collect()
        })
    }

    fn fixed_branches() -> (Vec<BranchId>, HashMap<BranchId, String>) {
        let ids: Vec<BranchId> = (1..=3u128).map(|n| BranchId::from(uuid::Uuid::from_u128(n))).collect();
        let names = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, format!("Branch {}", i)))
            .collect();
        (ids, names)
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent(
            records in arb_records(fixed_branches().0),
            from in 0i64..1000,
            span in 0i64..400,
        ) {
            let start = date(2023, 1, 1) + chrono::Duration::days(from);
            let criteria = FilterCriteria::between(start, start + chrono::Duration::days(span));

            let once = filter(&records, &criteria);
            let twice = filter(&once, &criteria);
            let once_ids: Vec<_> = once.iter().map(|r| r.id).collect();
            let twice_ids: Vec<_> = twice.iter().map(|r| r.id).collect();
            prop_assert_eq!(once_ids, twice_ids);
        }

        #[test]
        fn prop_branch_totals_sum_to_summary(records in arb_records(fixed_branches().0)) {
            let (_, names) = fixed_branches();
            let groups = group_by_branch(&records, &names);

            let grouped: Money = groups.iter().map(|g| g.total).sum();
            let counted: usize = groups.iter().map(|g| g.count).sum();
            let summary = summarize(&records);
            prop_assert_eq!(grouped, summary.total);
            prop_assert_eq!(counted, summary.count);
        }

        #[test]
        fn prop_branch_groups_sorted_descending(records in arb_records(fixed_branches().0)) {
            let (_, names) = fixed_branches();
            let groups = group_by_branch(&records, &names);
            prop_assert!(groups.windows(2).all(|w| w[0].total >= w[1].total));
        }

        #[test]
        fn prop_buckets_sorted_ascending(
            records in arb_records(fixed_branches().0),
            bucket in prop_oneof![Just(BucketSize::Day), Just(BucketSize::Week), Just(BucketSize::Month)],
        ) {
            let buckets = group_by_time_bucket(&records, bucket);
            prop_assert!(buckets.windows(2).all(|w| w[0].label < w[1].label));

            let dated: Vec<_> = records.iter().filter(|r| r.date().is_some()).cloned().collect();
            let bucketed: Money = buckets.iter().map(|b| b.total).sum();
            prop_assert_eq!(bucketed, summarize(&dated).total);
        }
    }
}
