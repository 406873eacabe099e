//! Stock level and stock audit display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::report::format_signed;
use crate::models::{ProductId, StockAudit, StockRecord, WarehouseId};
use crate::services::LowStockItem;

#[derive(Tabled)]
struct StockRow {
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Warehouse")]
    warehouse: String,
    #[tabled(rename = "Qty")]
    quantity: i64,
    #[tabled(rename = "Cost")]
    cost: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Warehouse")]
    warehouse: String,
    #[tabled(rename = "Recorded")]
    recorded: i64,
    #[tabled(rename = "Counted")]
    counted: i64,
    #[tabled(rename = "Variance")]
    variance: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn name_of<K: std::hash::Hash + Eq + ToString>(names: &HashMap<K, String>, id: &K) -> String {
    names.get(id).cloned().unwrap_or_else(|| id.to_string())
}

/// Format stock rows as a table
pub fn format_stock_list(stock: &[StockRecord], warehouse_names: &HashMap<WarehouseId, String>) -> String {
    if stock.is_empty() {
        return "No stock on record.".to_string();
    }

    let rows = stock.iter().map(|s| StockRow {
        product: s.product_name.clone(),
        warehouse: name_of(warehouse_names, &s.warehouse_id),
        quantity: s.quantity,
        cost: s.purchase_price.to_string(),
        value: s.value().to_string(),
    });

    Table::new(rows).with(Style::sharp()).to_string()
}

/// Format low-stock items, lowest first as given
pub fn format_low_stock(items: &[LowStockItem], warehouse_names: &HashMap<WarehouseId, String>) -> String {
    if items.is_empty() {
        return "All products are above their minimum stock level.".to_string();
    }

    let mut output = format!(
        "{:<30} {:<20} {:>6} {:>6} {:>8}\n",
        "Product", "Warehouse", "Qty", "Min", "Short"
    );
    for item in items {
        output.push_str(&format!(
            "{:<30} {:<20} {:>6} {:>6} {:>8}\n",
            super::report::truncate(&item.stock.product_name, 30),
            super::report::truncate(&name_of(warehouse_names, &item.stock.warehouse_id), 20),
            item.stock.quantity,
            item.min_stock,
            item.shortfall()
        ));
    }

    output
}

/// Format stock audits as a table
pub fn format_audit_list(
    audits: &[StockAudit],
    product_names: &HashMap<ProductId, String>,
    warehouse_names: &HashMap<WarehouseId, String>,
) -> String {
    if audits.is_empty() {
        return "No stock audits found.".to_string();
    }

    let rows = audits.iter().map(|a| AuditRow {
        id: a.id.to_string(),
        product: name_of(product_names, &a.product_id),
        warehouse: name_of(warehouse_names, &a.warehouse_id),
        recorded: a.recorded_quantity,
        counted: a.counted_quantity,
        variance: format_signed(a.variance()),
        status: a.status.to_string(),
    });

    Table::new(rows).with(Style::sharp()).to_string()
}

/// Format one audit after a review action
pub fn format_audit_details(audit: &StockAudit) -> String {
    let mut output = String::new();

    output.push_str(&format!("Stock audit {}\n", audit.id));
    output.push_str(&format!("  Status:    {}\n", audit.status));
    output.push_str(&format!("  Recorded:  {}\n", audit.recorded_quantity));
    output.push_str(&format!("  Counted:   {}\n", audit.counted_quantity));
    output.push_str(&format!("  Variance:  {}\n", format_signed(audit.variance())));
    if !audit.note.is_empty() {
        output.push_str(&format!("  Note:      {}\n", audit.note));
    }
    if !audit.reason.is_empty() {
        output.push_str(&format!("  Reason:    {}\n", audit.reason));
    }

    output
}
