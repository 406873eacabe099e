//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod branch;
pub mod call;
pub mod catalog;
pub mod filters;
pub mod record;
pub mod report;
pub mod stock;
pub mod trade;

pub use branch::{handle_branch_command, handle_warehouse_command, BranchCommands, WarehouseCommands};
pub use call::{handle_call_command, CallArgs};
pub use catalog::{handle_category_command, handle_product_command, CategoryCommands, ProductCommands};
pub use filters::FilterArgs;
pub use record::{handle_record_command, RecordCommands};
pub use report::{handle_report_command, ReportCommands};
pub use stock::{handle_audit_command, handle_stock_command, AuditCommands, StockCommands};
pub use trade::{handle_purchase_command, handle_sale_command, PurchaseCommands, SaleCommands};

use crate::error::{BranchbookError, BranchbookResult};

/// Find the one item whose full id starts with `input`, so the short ids
/// shown in tables (`aud-1a2b3c4d`) can be typed back in.
pub(crate) fn match_id<'a, T>(
    items: &'a [T],
    input: &str,
    prefix: &str,
    full_id: impl Fn(&T) -> String,
    entity_type: &'static str,
) -> BranchbookResult<&'a T> {
    let lowered = input.trim().to_lowercase();
    let needle = lowered.strip_prefix(prefix).unwrap_or(lowered.as_str());
    if needle.is_empty() {
        return Err(BranchbookError::Validation(format!("{} ID cannot be empty", entity_type)));
    }

    let mut matches = items.iter().filter(|&item| full_id(item).starts_with(needle));
    match (matches.next(), matches.next()) {
        (Some(item), None) => Ok(item),
        (None, _) => Err(BranchbookError::NotFound {
            entity_type,
            identifier: input.to_string(),
        }),
        (Some(_), Some(_)) => Err(BranchbookError::Validation(format!(
            "{} ID '{}' is ambiguous; give more characters",
            entity_type, input
        ))),
    }
}
