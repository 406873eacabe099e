//! JSON snapshot export
//!
//! Dumps every table of the data store into one versioned document.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{Branch, Category, Product, StockAudit, StockRecord, TransactionRecord, Warehouse};
use crate::services::{BranchService, CatalogService, RecordService, StockService, WarehouseService};
use crate::storage::DataStore;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full data store snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub branches: Vec<Branch>,
    pub warehouses: Vec<Warehouse>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub stock: Vec<StockRecord>,
    pub stock_audits: Vec<StockAudit>,

    /// Sales, external sales, purchases and expenses
    pub records: Vec<TransactionRecord>,

    pub metadata: ExportMetadata,
}

/// Counts for a quick look at an export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub branch_count: usize,
    pub product_count: usize,
    pub record_count: usize,
    pub stock_units: i64,
    pub earliest_record: Option<String>,
    pub latest_record: Option<String>,
}

impl FullExport {
    /// Read every table from the store
    pub fn from_store(store: &dyn DataStore) -> BranchbookResult<Self> {
        let catalog = CatalogService::new(store);
        let stock_service = StockService::new(store);

        let branches = BranchService::new(store).list()?;
        let warehouses = WarehouseService::new(store).list()?;
        let categories = catalog.list_categories()?;
        let products = catalog.list_products()?;
        let stock = stock_service.list(None)?;
        let stock_audits = stock_service.audits(None)?;
        let records = RecordService::new(store).list_all()?;

        let mut dates: Vec<_> = records.iter().filter_map(|r| r.parsed_date()).collect();
        dates.sort();

        let metadata = ExportMetadata {
            branch_count: branches.len(),
            product_count: products.len(),
            record_count: records.len(),
            stock_units: stock.iter().fold(0i64, |acc, s| acc.saturating_add(s.quantity)),
            earliest_record: dates.first().map(|d| d.to_string()),
            latest_record: dates.last().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            branches,
            warehouses,
            categories,
            products,
            stock,
            stock_audits,
            records,
            metadata,
        })
    }

    /// Check the schema version and that references point at exported rows
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let branch_ids: HashSet<_> = self.branches.iter().map(|b| b.id).collect();
        let warehouse_ids: HashSet<_> = self.warehouses.iter().map(|w| w.id).collect();
        let category_ids: HashSet<_> = self.categories.iter().map(|c| c.id).collect();
        let product_ids: HashSet<_> = self.products.iter().map(|p| p.id).collect();

        for wh in &self.warehouses {
            if let Some(branch_id) = wh.branch_id {
                if !branch_ids.contains(&branch_id) {
                    return Err(format!("Warehouse {} references unknown branch {}", wh.id, branch_id));
                }
            }
        }

        for product in &self.products {
            if let Some(category_id) = product.category_id {
                if !category_ids.contains(&category_id) {
                    return Err(format!(
                        "Product {} references unknown category {}",
                        product.id, category_id
                    ));
                }
            }
        }

        for row in &self.stock {
            if !product_ids.contains(&row.product_id) {
                return Err(format!("Stock {} references unknown product {}", row.id, row.product_id));
            }
            if !warehouse_ids.contains(&row.warehouse_id) {
                return Err(format!(
                    "Stock {} references unknown warehouse {}",
                    row.id, row.warehouse_id
                ));
            }
        }

        Ok(())
    }
}

/// Export the full data store to JSON
pub fn export_full_json<W: Write>(
    store: &dyn DataStore,
    writer: &mut W,
    pretty: bool,
) -> BranchbookResult<()> {
    let export = FullExport::from_store(store)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| BranchbookError::Export(e.to_string()))?;

    Ok(())
}

/// Parse and check a JSON export
pub fn import_from_json(json_str: &str) -> BranchbookResult<FullExport> {
    let export: FullExport = serde_json::from_str(json_str)?;
    export.validate().map_err(BranchbookError::Validation)?;
    Ok(export)
}
