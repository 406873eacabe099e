//! Warehouse service

use tracing::info;

use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{BranchId, Warehouse, WarehouseId};
use crate::storage::{tables, DataStore, DataStoreExt, Filter};

use super::branch::BranchService;

/// Service for warehouse management
pub struct WarehouseService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> WarehouseService<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Create a warehouse, optionally attached to a branch
    pub fn create(&self, name: &str, branch_id: Option<BranchId>) -> BranchbookResult<Warehouse> {
        let warehouse = Warehouse::new(name.trim(), branch_id);
        warehouse.validate().map_err(BranchbookError::Validation)?;

        if let Some(branch_id) = branch_id {
            if BranchService::new(self.store).get(branch_id)?.is_none() {
                return Err(BranchbookError::branch_not_found(branch_id.to_string()));
            }
        }

        if self.get_by_name(&warehouse.name)?.is_some() {
            return Err(BranchbookError::Duplicate {
                entity_type: "Warehouse",
                identifier: warehouse.name.clone(),
            });
        }

        let warehouse = self.store.insert_as(tables::WAREHOUSES, &warehouse)?;
        info!(warehouse = %warehouse.id, name = %warehouse.name, "created warehouse");
        Ok(warehouse)
    }

    pub fn list(&self) -> BranchbookResult<Vec<Warehouse>> {
        self.store.select_as(tables::WAREHOUSES, &[])
    }

    /// Warehouses attached to one branch
    pub fn list_for_branch(&self, branch_id: BranchId) -> BranchbookResult<Vec<Warehouse>> {
        self.store
            .select_as(tables::WAREHOUSES, &[Filter::eq("branch_id", branch_id)])
    }

    pub fn get(&self, id: WarehouseId) -> BranchbookResult<Option<Warehouse>> {
        self.store.find_as(tables::WAREHOUSES, &[Filter::eq("id", id)])
    }

    pub fn get_by_name(&self, name: &str) -> BranchbookResult<Option<Warehouse>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .find(|w| w.name.to_lowercase() == name))
    }

    /// Find a warehouse by name or ID string
    pub fn find(&self, identifier: &str) -> BranchbookResult<Option<Warehouse>> {
        if let Some(warehouse) = self.get_by_name(identifier)? {
            return Ok(Some(warehouse));
        }

        if let Ok(id) = identifier.parse::<WarehouseId>() {
            return self.get(id);
        }

        Ok(None)
    }

    pub fn resolve(&self, identifier: &str) -> BranchbookResult<Warehouse> {
        self.find(identifier)?
            .ok_or_else(|| BranchbookError::warehouse_not_found(identifier))
    }
}
