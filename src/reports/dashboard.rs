//! Dashboard summary
//!
//! Headline figures for the home screen: totals per record kind, gross
//! profit, stock value and the revenue series.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{BranchId, BucketSize, Money, RecordKind, StockRecord, TransactionRecord};
use crate::services::{BranchService, RecordService, StockService, WarehouseService};
use crate::storage::DataStore;

use super::aggregator::{
    filter, group_by_branch, group_by_time_bucket, summarize, BranchTotal, BucketTotal,
    FilterCriteria, Summary,
};
use super::stock::StockValuationReport;

/// Dashboard figures for one filtered period
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub period: String,
    pub sales: Summary,
    pub external_sales: Summary,
    pub purchases: Summary,
    pub expenses: Summary,
    /// Sales plus external sales, minus purchases and expenses
    pub gross_profit: Money,
    pub stock_value: Money,
    pub low_stock_count: usize,
    /// Revenue (sales and external sales) per time bucket
    pub revenue_series: Vec<BucketTotal>,
    /// Revenue per branch, largest first
    pub revenue_by_branch: Vec<BranchTotal>,
}

/// Inputs already fetched from the store
pub struct DashboardData<'d> {
    pub sales: &'d [TransactionRecord],
    pub external_sales: &'d [TransactionRecord],
    pub purchases: &'d [TransactionRecord],
    pub expenses: &'d [TransactionRecord],
    pub stock: &'d StockValuationReport,
    pub branches: &'d HashMap<BranchId, String>,
}

impl DashboardSummary {
    pub fn generate(
        store: &dyn DataStore,
        criteria: &FilterCriteria,
        bucket: BucketSize,
        default_min: i64,
    ) -> BranchbookResult<Self> {
        let records = RecordService::new(store);
        let sales = records.list(RecordKind::Sale)?;
        let external_sales = records.list(RecordKind::ExternalSale)?;
        let purchases = records.list(RecordKind::Purchase)?;
        let expenses = records.list(RecordKind::Expense)?;
        let branches = BranchService::new(store).names()?;

        let stock_service = StockService::new(store);
        let stock_rows: Vec<StockRecord> = stock_service.list(None)?;
        let stock = StockValuationReport::from_rows(
            &stock_rows,
            &WarehouseService::new(store).list()?,
            &branches,
            &stock_service.minimums(default_min)?,
            criteria,
        );

        Ok(Self::from_data(
            DashboardData {
                sales: &sales,
                external_sales: &external_sales,
                purchases: &purchases,
                expenses: &expenses,
                stock: &stock,
                branches: &branches,
            },
            criteria,
            bucket,
        ))
    }

    pub fn from_data(data: DashboardData<'_>, criteria: &FilterCriteria, bucket: BucketSize) -> Self {
        let sales = filter(data.sales, criteria);
        let external_sales = filter(data.external_sales, criteria);
        let purchases = filter(data.purchases, criteria);
        let expenses = filter(data.expenses, criteria);

        let revenue: Vec<TransactionRecord> = sales.iter().chain(&external_sales).cloned().collect();

        let sales_summary = summarize(&sales);
        let external_summary = summarize(&external_sales);
        let purchases_summary = summarize(&purchases);
        let expenses_summary = summarize(&expenses);

        Self {
            period: criteria.date_range_label(),
            gross_profit: sales_summary.total + external_summary.total
                - purchases_summary.total
                - expenses_summary.total,
            sales: sales_summary,
            external_sales: external_summary,
            purchases: purchases_summary,
            expenses: expenses_summary,
            stock_value: data.stock.total_value,
            low_stock_count: data.stock.low_stock.len(),
            revenue_series: group_by_time_bucket(&revenue, bucket),
            revenue_by_branch: group_by_branch(&revenue, data.branches),
        }
    }

    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Dashboard: {}\n", self.period));
        output.push_str(&"=".repeat(50));
        output.push('\n');

        let line = |label: &str, s: &Summary| format!("{:<18} {:>16} {:>8}\n", label, s.total, s.count);
        output.push_str(&line("Sales", &self.sales));
        output.push_str(&line("External sales", &self.external_sales));
        output.push_str(&line("Purchases", &self.purchases));
        output.push_str(&line("Expenses", &self.expenses));
        output.push_str(&"-".repeat(50));
        output.push('\n');
        output.push_str(&format!("{:<18} {:>16}\n", "Gross profit", self.gross_profit));
        output.push_str(&format!("{:<18} {:>16}\n", "Stock value", self.stock_value));
        output.push_str(&format!("{:<18} {:>16}\n", "Low stock items", self.low_stock_count));

        if !self.revenue_by_branch.is_empty() {
            output.push_str("\nRevenue by branch\n");
            for branch in &self.revenue_by_branch {
                output.push_str(&format!(
                    "  {:<24} {:>16}\n",
                    branch.branch_name, branch.total
                ));
            }
        }

        output
    }

    /// Export the headline figures to CSV
    pub fn export_csv<W: Write>(&self, writer: &mut W) -> BranchbookResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        let rows = [
            ("sales", self.sales.total, self.sales.count.to_string()),
            ("external_sales", self.external_sales.total, self.external_sales.count.to_string()),
            ("purchases", self.purchases.total, self.purchases.count.to_string()),
            ("expenses", self.expenses.total, self.expenses.count.to_string()),
            ("gross_profit", self.gross_profit, String::new()),
            ("stock_value", self.stock_value, self.low_stock_count.to_string()),
        ];

        csv.write_record(["Metric", "Amount", "Count"])
            .map_err(|e| BranchbookError::Export(e.to_string()))?;
        for (metric, amount, count) in rows {
            csv.write_record([metric.to_string(), format!("{:.2}", amount.as_f64()), count])
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
    use crate::models::ProductId;
    use crate::services::{ItemInput, ProcedureService, PurchaseInput, SaleInput};
    use crate::storage::JsonStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn rec(kind: RecordKind, day: u32, cents: i64) -> TransactionRecord {
        TransactionRecord::new(
            kind,
            NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            Money::from_cents(cents),
        )
    }

    #[test]
    fn test_gross_profit() {
        let sales = vec![rec(RecordKind::Sale, 1, 10_000), rec(RecordKind::Sale, 2, 5_000)];
        let external = vec![rec(RecordKind::ExternalSale, 2, 2_000)];
        let purchases = vec![rec(RecordKind::Purchase, 1, 6_000)];
        let expenses = vec![rec(RecordKind::Expense, 3, 1_500)];
        let stock = StockValuationReport::from_rows(
            &[],
            &[],
            &HashMap::new(),
            &HashMap::<ProductId, i64>::new(),
            &FilterCriteria::new(),
        );
        let branches = HashMap::new();

        let dash = DashboardSummary::from_data(
            DashboardData {
                sales: &sales,
                external_sales: &external,
                purchases: &purchases,
                expenses: &expenses,
                stock: &stock,
                branches: &branches,
            },
            &FilterCriteria::new(),
            BucketSize::Day,
        );

        assert_eq!(dash.gross_profit, Money::from_cents(9_500));
        assert_eq!(dash.sales.count, 2);
        assert_eq!(dash.revenue_series.len(), 2);
        assert_eq!(dash.revenue_series[1].total, Money::from_cents(7_000));
        assert_eq!(dash.revenue_by_branch.len(), 1);
    }

    #[test]
    fn test_generate_from_store() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = JsonStore::open(paths).unwrap();

        let branch = BranchService::new(&store).create("Central", None).unwrap();
        let wh = WarehouseService::new(&store).create("Central Store", Some(branch.id)).unwrap();
        let mut soap = crate::models::Product::new("Soap", Money::from_cents(100), Money::from_cents(250));
        soap.min_stock = 5;
        let soap = crate::services::CatalogService::new(&store).create_product(soap).unwrap();

        let procedures = ProcedureService::new(&store);
        procedures
            .record_purchase(PurchaseInput::new(wh.id, vec![ItemInput::new(soap.id, 10)]))
            .unwrap();
        procedures
            .record_sale(SaleInput::new(wh.id, vec![ItemInput::new(soap.id, 6)]), false)
            .unwrap();

        let dash = DashboardSummary::generate(&store, &FilterCriteria::new(), BucketSize::Month, 5).unwrap();

        assert_eq!(dash.purchases.total, Money::from_cents(1_000));
        assert_eq!(dash.sales.total, Money::from_cents(1_500));
        assert_eq!(dash.gross_profit, Money::from_cents(500));
        assert_eq!(dash.stock_value, Money::from_cents(400));
        assert_eq!(dash.low_stock_count, 1);
        assert_eq!(dash.revenue_by_branch[0].branch_name, "Central");

        let text = dash.format_terminal();
        assert!(text.contains("Gross profit"));

        let mut out = Vec::new();
        dash.export_csv(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("gross_profit,5.00,"));
    }
}
