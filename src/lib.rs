//! branchbook - multi-branch retail and inventory ledger
//!
//! This library keeps branches, warehouses, products, stock and the four
//! kinds of transaction records (sales, external sales, purchases and
//! expenses) in a local JSON data store, and turns filtered snapshots of
//! those records into summaries, per-branch totals and time series.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (branches, products, stock, records)
//! - `storage`: The `DataStore` trait and its JSON file implementation
//! - `audit`: Audit logging of every committed write
//! - `services`: CRUD services, transactional procedures and fetch sequencing
//! - `reports`: The report aggregator and the reports built on it
//! - `view`: Filter and pagination state carried in a URL query string
//! - `export`: CSV, JSON and YAML output
//! - `display` and `cli`: Terminal output and command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use branchbook::config::paths::BranchbookPaths;
//! use branchbook::reports::{FilterCriteria, TransactionReport};
//! use branchbook::storage::JsonStore;
//!
//! let store = JsonStore::open(BranchbookPaths::new()?)?;
//! let report = TransactionReport::generate(&store, RecordKind::Sale, &FilterCriteria::new(), BucketSize::Month)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;
pub mod view;

pub use error::{BranchbookError, BranchbookResult};
