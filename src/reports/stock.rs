//! Stock Valuation Report
//!
//! Current stock per warehouse valued at purchase price, plus the products
//! at or below their minimum level. Stock is a point-in-time snapshot, so
//! date bounds in the criteria are ignored.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::display::report::{format_percentage, separator, truncate};
use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{BranchId, Money, ProductId, StockRecord, Warehouse, WarehouseId};
use crate::services::{is_low_stock, BranchService, LowStockItem, StockService, WarehouseService};
use crate::storage::DataStore;

use super::aggregator::{filter, summarize, FilterCriteria, UNKNOWN_BRANCH};

/// Stock held in one warehouse
#[derive(Debug, Clone, Serialize)]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub branch_name: String,
    /// Distinct products held
    pub products: usize,
    pub units: i64,
    pub value: Money,
}

/// Stock valuation across warehouses
#[derive(Debug, Clone, Serialize)]
pub struct StockValuationReport {
    pub warehouses: Vec<WarehouseStock>,
    pub total_units: i64,
    pub total_value: Money,
    #[serde(skip)]
    pub low_stock: Vec<LowStockItem>,
}

impl StockValuationReport {
    /// Fetch stock, warehouses and branches and value them
    pub fn generate(store: &dyn DataStore, criteria: &FilterCriteria, default_min: i64) -> BranchbookResult<Self> {
        let stock_service = StockService::new(store);
        let stock = stock_service.list(None)?;
        let minimums = stock_service.minimums(default_min)?;
        let warehouses = WarehouseService::new(store).list()?;
        let branches = BranchService::new(store).names()?;

        Ok(Self::from_rows(&stock, &warehouses, &branches, &minimums, criteria))
    }

    /// Value already-fetched stock rows
    pub fn from_rows(
        stock: &[StockRecord],
        warehouses: &[Warehouse],
        branches: &HashMap<BranchId, String>,
        minimums: &HashMap<ProductId, i64>,
        criteria: &FilterCriteria,
    ) -> Self {
        let criteria = FilterCriteria {
            date_from: None,
            date_to: None,
            ..criteria.clone()
        };
        let rows = filter(stock, &criteria);

        let mut per_warehouse: Vec<WarehouseStock> = Vec::new();
        let mut index: HashMap<WarehouseId, usize> = HashMap::new();

        for row in &rows {
            let slot = *index.entry(row.warehouse_id).or_insert_with(|| {
                let warehouse = warehouses.iter().find(|w| w.id == row.warehouse_id);
                let branch_name = warehouse
                    .and_then(|w| w.branch_id)
                    .or(row.branch_id)
                    .and_then(|id| branches.get(&id).cloned())
                    .unwrap_or_else(|| UNKNOWN_BRANCH.to_string());
                per_warehouse.push(WarehouseStock {
                    warehouse_id: row.warehouse_id,
                    warehouse_name: warehouse
                        .map(|w| w.name.clone())
                        .unwrap_or_else(|| row.warehouse_id.to_string()),
                    branch_name,
                    products: 0,
                    units: 0,
                    value: Money::zero(),
                });
                per_warehouse.len() - 1
            });

            let entry = &mut per_warehouse[slot];
            entry.products += 1;
            entry.units += row.quantity;
            entry.value += row.value();
        }

        per_warehouse.sort_by(|a, b| b.value.cmp(&a.value));

        let mut low_stock: Vec<LowStockItem> = rows
            .iter()
            .filter_map(|row| {
                let min_stock = minimums.get(&row.product_id).copied()?;
                is_low_stock(row.quantity, min_stock).then(|| LowStockItem {
                    stock: row.clone(),
                    min_stock,
                })
            })
            .collect();
        low_stock.sort_by_key(|item| item.stock.quantity);

        Self {
            total_units: rows.iter().fold(0i64, |acc, r| acc.saturating_add(r.quantity)),
            total_value: summarize(&rows).total,
            warehouses: per_warehouse,
            low_stock,
        }
    }

    /// Format the report for terminal display
    pub fn format_terminal(&self) -> String {
        let mut output = String::new();

        output.push_str("Stock Valuation\n");
        output.push_str(&"=".repeat(78));
        output.push('\n');
        output.push_str(&format!(
            "{:<22} {:<18} {:>8} {:>10} {:>12} {:>5}\n",
            "Warehouse", "Branch", "Products", "Units", "Value", "%"
        ));
        output.push_str(&separator(78));
        output.push('\n');

        for wh in &self.warehouses {
            let share = if self.total_value.is_zero() {
                0.0
            } else {
                wh.value.as_f64() / self.total_value.as_f64() * 100.0
            };
            output.push_str(&format!(
                "{:<22} {:<18} {:>8} {:>10} {:>12} {:>5}\n",
                truncate(&wh.warehouse_name, 22),
                truncate(&wh.branch_name, 18),
                wh.products,
                wh.units,
                wh.value,
                format_percentage(share)
            ));
        }

        output.push_str(&separator(78));
        output.push('\n');
        output.push_str(&format!(
            "{:<22} {:<18} {:>8} {:>10} {:>12}\n",
            "TOTAL", "", "", self.total_units, self.total_value
        ));

        if !self.low_stock.is_empty() {
            output.push_str(&format!("\nLOW STOCK ({})\n", self.low_stock.len()));
            for item in &self.low_stock {
                output.push_str(&format!(
                    "  {:<30} {:>6} / min {:<6}\n",
                    truncate(&item.stock.product_name, 30),
                    item.stock.quantity,
                    item.min_stock
                ));
            }
        }

        output
    }

    /// Export per-warehouse values to CSV
    pub fn export_csv<W: Write>(&self, writer: &mut W) -> BranchbookResult<()> {
        let mut csv = csv::Writer::from_writer(writer);

        csv.write_record(["Warehouse", "Branch", "Products", "Units", "Value"])
            .map_err(|e| BranchbookError::Export(e.to_string()))?;

        for wh in &self.warehouses {
            csv.write_record([
                wh.warehouse_name.clone(),
                wh.branch_name.clone(),
                wh.products.to_string(),
                wh.units.to_string(),
                format!("{:.2}", wh.value.as_f64()),
            ])
            .map_err(|e| BranchbookError::Export(e.to_string()))?;
        }

        csv.flush()
            .map_err(|e| BranchbookError::Export(e.to_string()))?;
        Ok(())
    }
}
