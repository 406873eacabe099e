//! Core data models for branchbook
//!
//! Flat records as the data store returns them: branches, warehouses,
//! the product catalog, stock levels, stock audits and transaction records.

pub mod branch;
pub mod ids;
pub mod money;
pub mod period;
pub mod product;
pub mod record;
pub mod stock;

pub use branch::{Branch, Warehouse};
pub use ids::{BranchId, CategoryId, ProductId, RecordId, StockAuditId, StockId, UserId, WarehouseId};
pub use money::Money;
pub use period::{parse_record_date, BucketSize};
pub use product::{Category, Product};
pub use record::{LineItem, RecordKind, RecordValidationError, TransactionRecord};
pub use stock::{AuditStatus, StockAudit, StockRecord};
