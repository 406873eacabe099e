//! Branch and warehouse display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Branch, BranchId, Warehouse};
use crate::reports::UNKNOWN_BRANCH;

#[derive(Tabled)]
struct BranchRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Warehouses")]
    warehouses: usize,
    #[tabled(rename = "Active")]
    active: &'static str,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct WarehouseRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "ID")]
    id: String,
}

/// Format branches as a table with their warehouse counts
pub fn format_branch_list(branches: &[Branch], warehouses: &[Warehouse]) -> String {
    if branches.is_empty() {
        return "No branches found.".to_string();
    }

    let rows = branches.iter().map(|b| BranchRow {
        name: b.name.clone(),
        address: b.address.clone(),
        warehouses: warehouses
            .iter()
            .filter(|w| w.branch_id == Some(b.id))
            .count(),
        active: if b.is_active { "yes" } else { "no" },
        id: b.id.to_string(),
    });

    Table::new(rows).with(Style::sharp()).to_string()
}

/// Format warehouses as a table, naming the owning branch
pub fn format_warehouse_list(warehouses: &[Warehouse], branch_names: &HashMap<BranchId, String>) -> String {
    if warehouses.is_empty() {
        return "No warehouses found.".to_string();
    }

    let rows = warehouses.iter().map(|w| WarehouseRow {
        name: w.name.clone(),
        branch: w
            .branch_id
            .and_then(|id| branch_names.get(&id).cloned())
            .unwrap_or_else(|| UNKNOWN_BRANCH.to_string()),
        id: w.id.to_string(),
    });

    Table::new(rows).with(Style::sharp()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_list() {
        let north = Branch::new("North");
        let warehouses = vec![
            Warehouse::new("N1", Some(north.id)),
            Warehouse::new("N2", Some(north.id)),
            Warehouse::new("Loose", None),
        ];

        let output = format_branch_list(&[north], &warehouses);
        assert!(output.contains("North"));
        assert!(output.contains("Warehouses"));
        assert!(output.contains(" 2 "));
    }

    #[test]
    fn test_warehouse_list_unknown_branch() {
        let output = format_warehouse_list(&[Warehouse::new("Loose", None)], &HashMap::new());
        assert!(output.contains("Unknown Branch"));
        assert_eq!(format_warehouse_list(&[], &HashMap::new()), "No warehouses found.");
    }
}
