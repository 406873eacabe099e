//! Storage initialization
//!
//! Handles first-run setup and default data creation

use crate::error::BranchbookResult;
use crate::models::{Branch, Category, Warehouse};

use super::json_store::JsonStore;
use super::tables;

const DEFAULT_CATEGORIES: &[&str] = &["General", "Food & Beverage", "Household", "Personal Care"];

/// Initialize storage for a fresh installation
///
/// Creates the default categories and a main branch with its warehouse. Tables
/// that already hold rows are left alone.
pub fn initialize_storage(store: &JsonStore) -> BranchbookResult<()> {
    store.paths().ensure_directories()?;

    store.transaction(|tx| {
        if tx.select(tables::CATEGORIES, &["id"], &[])?.is_empty() {
            for name in DEFAULT_CATEGORIES {
                tx.insert_as(tables::CATEGORIES, &Category::new(*name))?;
            }
        }

        if tx.select(tables::BRANCHES, &["id"], &[])?.is_empty() {
            let branch = tx.insert_as(tables::BRANCHES, &Branch::new("Main Branch"))?;

            if tx.select(tables::WAREHOUSES, &["id"], &[])?.is_empty() {
                tx.insert_as(
                    tables::WAREHOUSES,
                    &Warehouse::new("Main Warehouse", Some(branch.id)),
                )?;
            }
        }

        Ok(())
    })
}

/// Check if storage needs initialization
pub fn needs_initialization(store: &JsonStore) -> bool {
    !store.paths().table_file(tables::BRANCHES).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BranchbookPaths;
    use crate::storage::{DataStore, DataStoreExt, Filter};
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, JsonStore) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BranchbookPaths::with_base_dir(temp_dir.path().to_path_buf());
        (temp_dir, JsonStore::open(paths).unwrap())
    }

    #[test]
    fn test_initialize_storage() {
        let (_temp, store) = create_test_store();
        assert!(needs_initialization(&store));

        initialize_storage(&store).unwrap();

        assert!(!needs_initialization(&store));
        let categories: Vec<Category> = store.select_as(tables::CATEGORIES, &[]).unwrap();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, DEFAULT_CATEGORIES);
    }

    #[test]
    fn test_main_warehouse_belongs_to_main_branch() {
        let (_temp, store) = create_test_store();
        initialize_storage(&store).unwrap();

        let branches: Vec<Branch> = store.select_as(tables::BRANCHES, &[]).unwrap();
        assert_eq!(branches.len(), 1);
        let warehouses: Vec<Warehouse> = store
            .select_as(tables::WAREHOUSES, &[Filter::eq("branch_id", branches[0].id)])
            .unwrap();
        assert_eq!(warehouses.len(), 1);
        assert_eq!(warehouses[0].name, "Main Warehouse");
    }

    #[test]
    fn test_doesnt_overwrite_existing() {
        let (_temp, store) = create_test_store();
        store.insert_as(tables::BRANCHES, &Branch::new("Harbor")).unwrap();

        initialize_storage(&store).unwrap();
        initialize_storage(&store).unwrap();

        let branches = store.select(tables::BRANCHES, &["name"], &[]).unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0]["name"], "Harbor");
        assert_eq!(store.select(tables::CATEGORIES, &[], &[]).unwrap().len(), 4);
    }
}
