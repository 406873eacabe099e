//! Storage layer for branchbook
//!
//! The `DataStore` trait is the only way services reach data. `JsonStore`
//! implements it over one JSON file per table with atomic writes and
//! all-or-nothing transactions.

pub mod file_io;
pub mod init;
pub mod json_store;
pub mod store;

pub use file_io::{read_json, write_json_atomic};
pub use init::{initialize_storage, needs_initialization};
pub use json_store::{JsonStore, Tables};
pub use store::{DataStore, DataStoreExt, Filter, ProcedureResponse, ProcedureStatus, Row};

/// Table names
pub mod tables {
    pub const BRANCHES: &str = "branches";
    pub const WAREHOUSES: &str = "warehouses";
    pub const CATEGORIES: &str = "categories";
    pub const PRODUCTS: &str = "products";
    pub const STOCK: &str = "stock";
    pub const STOCK_AUDITS: &str = "stock_audits";
}
