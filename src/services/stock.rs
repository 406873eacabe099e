//! Stock service
//!
//! Read side of stock levels. Quantities only change through the procedures
//! in `services::procedures`.

use std::collections::HashMap;

use crate::error::BranchbookResult;
use crate::models::{AuditStatus, ProductId, StockAudit, StockRecord, WarehouseId};
use crate::storage::{tables, DataStore, DataStoreExt, Filter};

use super::catalog::CatalogService;

/// A stock row at or below its product's minimum
#[derive(Debug, Clone)]
pub struct LowStockItem {
    pub stock: StockRecord,
    pub min_stock: i64,
}

impl LowStockItem {
    /// Units needed to get back to the minimum
    pub fn shortfall(&self) -> i64 {
        (self.min_stock - self.stock.quantity).max(0)
    }
}

/// Whether `quantity` counts as low for a product minimum
pub fn is_low_stock(quantity: i64, min_stock: i64) -> bool {
    quantity <= min_stock
}

/// Service for stock levels
pub struct StockService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> StockService<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// All stock rows, or those of one warehouse
    pub fn list(&self, warehouse: Option<WarehouseId>) -> BranchbookResult<Vec<StockRecord>> {
        let filters: Vec<Filter> = warehouse
            .map(|id| vec![Filter::eq("warehouse_id", id)])
            .unwrap_or_default();
        self.store.select_as(tables::STOCK, &filters)
    }

    /// Quantity of a product in a warehouse, zero when there is no row
    pub fn quantity_of(&self, product_id: ProductId, warehouse_id: WarehouseId) -> BranchbookResult<i64> {
        let row: Option<StockRecord> = self.store.find_as(
            tables::STOCK,
            &[
                Filter::eq("product_id", product_id),
                Filter::eq("warehouse_id", warehouse_id),
            ],
        )?;
        Ok(row.map(|s| s.quantity).unwrap_or(0))
    }

    /// Product minimums keyed by product id. A product without its own
    /// minimum uses `default_min`.
    pub fn minimums(&self, default_min: i64) -> BranchbookResult<HashMap<ProductId, i64>> {
        Ok(CatalogService::new(self.store)
            .list_products()?
            .into_iter()
            .map(|p| {
                let min = if p.min_stock > 0 { p.min_stock } else { default_min };
                (p.id, min)
            })
            .collect())
    }

    /// Stock rows at or below their product minimum, lowest first
    pub fn low_stock(&self, warehouse: Option<WarehouseId>, default_min: i64) -> BranchbookResult<Vec<LowStockItem>> {
        let minimums = self.minimums(default_min)?;

        let mut items: Vec<LowStockItem> = self
            .list(warehouse)?
            .into_iter()
            .filter_map(|stock| {
                let min_stock = minimums.get(&stock.product_id).copied().unwrap_or(default_min);
                is_low_stock(stock.quantity, min_stock).then_some(LowStockItem { stock, min_stock })
            })
            .collect();

        items.sort_by_key(|item| item.stock.quantity);
        Ok(items)
    }

    /// Stock audits, optionally only those with `status`
    pub fn audits(&self, status: Option<AuditStatus>) -> BranchbookResult<Vec<StockAudit>> {
        let filters: Vec<Filter> = status
            .map(|s| vec![Filter::eq("status", s)])
            .unwrap_or_default();
        self.store.select_as(tables::STOCK_AUDITS, &filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BranchbookPaths;
    use crate::models::{Money, Product};
    use crate::storage::JsonStore;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, JsonStore) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());
        (temp_dir, JsonStore::open(paths).unwrap())
    }

    fn add_stock(store: &JsonStore, product: &Product, warehouse: WarehouseId, qty: i64) {
        let stock = StockRecord::new(product.id, &product.name, warehouse, qty, product.purchase_price);
        store.insert_as(tables::STOCK, &stock).unwrap();
    }

    #[test]
    fn test_list_and_quantity() {
        let (_temp, store) = create_test_store();
        let catalog = CatalogService::new(&store);
        let soap = catalog
            .create_product(Product::new("Soap", Money::from_cents(100), Money::from_cents(150)))
            .unwrap();
        let wh1 = WarehouseId::new();
        let wh2 = WarehouseId::new();
        add_stock(&store, &soap, wh1, 7);
        add_stock(&store, &soap, wh2, 2);

        let service = StockService::new(&store);
        assert_eq!(service.list(None).unwrap().len(), 2);
        assert_eq!(service.list(Some(wh2)).unwrap().len(), 1);
        assert_eq!(service.quantity_of(soap.id, wh1).unwrap(), 7);
        assert_eq!(service.quantity_of(soap.id, WarehouseId::new()).unwrap(), 0);
    }

    #[test]
    fn test_low_stock_uses_product_minimum() {
        let (_temp, store) = create_test_store();
        let catalog = CatalogService::new(&store);

        let mut towel = Product::new("Towel", Money::from_cents(500), Money::from_cents(800));
        towel.min_stock = 10;
        let towel = catalog.create_product(towel).unwrap();
        let soap = catalog
            .create_product(Product::new("Soap", Money::from_cents(100), Money::from_cents(150)))
            .unwrap();

        let wh = WarehouseId::new();
        add_stock(&store, &towel, wh, 10);
        add_stock(&store, &soap, wh, 6);

        let low = StockService::new(&store).low_stock(None, 5).unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].stock.product_id, towel.id);
        assert_eq!(low[0].shortfall(), 0);
    }

    #[test]
    fn test_is_low_stock_boundary() {
        assert!(is_low_stock(5, 5));
        assert!(!is_low_stock(6, 5));
    }
}
