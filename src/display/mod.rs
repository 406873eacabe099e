//! Display formatting for terminal output
//!
//! Tables and detail views for the CLI. Report-wide helpers live in
//! `report`.

pub mod branch;
pub mod catalog;
pub mod record;
pub mod report;
pub mod stock;

pub use branch::{format_branch_list, format_warehouse_list};
pub use catalog::{format_category_list, format_product_details, format_product_list};
pub use record::{format_record_details, format_record_page, format_trade_outcome};
pub use stock::{format_audit_details, format_audit_list, format_low_stock, format_stock_list};
