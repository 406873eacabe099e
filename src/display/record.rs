//! Transaction record display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::report::truncate;
use crate::models::{BranchId, TransactionRecord};
use crate::reports::UNKNOWN_BRANCH;
use crate::services::TradeOutcome;
use crate::view::Page;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Branch")]
    branch: String,
    #[tabled(rename = "Party")]
    party: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "ID")]
    id: String,
}

/// Format one page of records with a page footer
pub fn format_record_page(page: &Page<TransactionRecord>, branch_names: &HashMap<BranchId, String>) -> String {
    if page.total_items == 0 {
        return "No records match the current filters.".to_string();
    }
    if page.items.is_empty() {
        return format!("Page {} is past the end ({} pages).", page.page, page.total_pages);
    }

    let rows = page.items.iter().map(|r| RecordRow {
        date: r.date.clone(),
        kind: r.kind.to_string(),
        branch: r
            .branch_id
            .and_then(|id| branch_names.get(&id).cloned())
            .unwrap_or_else(|| UNKNOWN_BRANCH.to_string()),
        party: truncate(&r.party, 24),
        reference: r.reference.clone(),
        amount: r.amount.to_string(),
        id: r.id.to_string(),
    });

    let mut output = Table::new(rows).with(Style::sharp()).to_string();
    output.push_str(&format!(
        "\nPage {} of {} ({} records)",
        page.page, page.total_pages, page.total_items
    ));
    output
}

/// Format a single record with its line items
pub fn format_record_details(record: &TransactionRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} {}\n", record.kind, record.id));
    output.push_str(&format!("  Date:      {}\n", record.date));
    output.push_str(&format!("  Amount:    {}\n", record.amount));
    if !record.party.is_empty() {
        output.push_str(&format!("  Party:     {}\n", record.party));
    }
    if !record.reference.is_empty() {
        output.push_str(&format!("  Reference: {}\n", record.reference));
    }
    if !record.note.is_empty() {
        output.push_str(&format!("  Note:      {}\n", record.note));
    }

    if !record.items.is_empty() {
        output.push_str("  Items:\n");
        for item in &record.items {
            output.push_str(&format!(
                "    {:<28} {:>5} x {:>10} = {:>12}\n",
                truncate(&item.product_name, 28),
                item.quantity,
                item.unit_price,
                item.subtotal()
            ));
        }
    }

    output
}

/// Format the result of a purchase or sale
pub fn format_trade_outcome(outcome: &TradeOutcome) -> String {
    let mut output = format_record_details(&outcome.record);

    output.push_str("  Stock now:\n");
    for row in &outcome.stock {
        output.push_str(&format!(
            "    {:<28} {:>8}\n",
            truncate(&row.product_name, 28),
            row.quantity
        ));
    }

    output
}
