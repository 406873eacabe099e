//! Branch service
//!
//! Creates and looks up branches. Branch names double as the display key in
//! per-branch reports, so they are kept unique (case-insensitive).

use std::collections::HashMap;

use tracing::info;

use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{Branch, BranchId};
use crate::storage::{tables, DataStore, DataStoreExt, Filter};

/// Service for branch management
pub struct BranchService<'a> {
    store: &'a dyn DataStore,
}

impl<'a> BranchService<'a> {
    /// Create a new branch service
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    /// Create a new branch
    pub fn create(&self, name: &str, address: Option<&str>) -> BranchbookResult<Branch> {
        let name = name.trim();

        let mut branch = Branch::new(name);
        if let Some(address) = address {
            branch.address = address.trim().to_string();
        }
        branch.validate().map_err(BranchbookError::Validation)?;

        if self.get_by_name(name)?.is_some() {
            return Err(BranchbookError::Duplicate {
                entity_type: "Branch",
                identifier: name.to_string(),
            });
        }

        let branch = self.store.insert_as(tables::BRANCHES, &branch)?;
        info!(branch = %branch.id, name = %branch.name, "created branch");
        Ok(branch)
    }

    /// All branches in creation order
    pub fn list(&self) -> BranchbookResult<Vec<Branch>> {
        self.store.select_as(tables::BRANCHES, &[])
    }

    pub fn get(&self, id: BranchId) -> BranchbookResult<Option<Branch>> {
        self.store.find_as(tables::BRANCHES, &[Filter::eq("id", id)])
    }

    /// Get a branch by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> BranchbookResult<Option<Branch>> {
        let name = name.trim().to_lowercase();
        Ok(self
            .list()?
            .into_iter()
            .find(|b| b.name.to_lowercase() == name))
    }

    /// Find a branch by name or ID string
    pub fn find(&self, identifier: &str) -> BranchbookResult<Option<Branch>> {
        if let Some(branch) = self.get_by_name(identifier)? {
            return Ok(Some(branch));
        }

        if let Ok(id) = identifier.parse::<BranchId>() {
            return self.get(id);
        }

        Ok(None)
    }

    /// Like `find`, but a missing branch is an error
    pub fn resolve(&self, identifier: &str) -> BranchbookResult<Branch> {
        self.find(identifier)?
            .ok_or_else(|| BranchbookError::branch_not_found(identifier))
    }

    /// Branch names keyed by id, for report grouping
    pub fn names(&self) -> BranchbookResult<HashMap<BranchId, String>> {
        Ok(self.list()?.into_iter().map(|b| (b.id, b.name)).collect())
    }
}
