//! Service layer for branchbook
//!
//! The service layer provides business logic on top of the data store,
//! handling validation, name/id lookup and the multi-table procedures.

pub mod branch;
pub mod catalog;
pub mod fetch;
pub mod procedures;
pub mod record;
pub mod stock;
pub mod warehouse;

pub use branch::BranchService;
pub use catalog::CatalogService;
pub use fetch::{RequestToken, RequestTracker, Snapshot};
pub use procedures::{
    dispatch, ItemInput, ProcedureService, PurchaseInput, SaleInput, SubmitAuditInput, TradeOutcome,
};
pub use record::RecordService;
pub use stock::{is_low_stock, LowStockItem, StockService};
pub use warehouse::WarehouseService;
