//! Reports module for branchbook
//!
//! The aggregator holds the pure filter/total/group operations; the report
//! types fetch from the data store, aggregate, and format the result for
//! the terminal or CSV.

pub mod aggregator;
pub mod dashboard;
pub mod stock;
pub mod transaction;

pub use aggregator::{
    filter, group_by_branch, group_by_time_bucket, summarize, BranchTotal, BucketTotal,
    FilterCriteria, ReportRow, Summary, UNKNOWN_BRANCH,
};
pub use dashboard::{DashboardData, DashboardSummary};
pub use stock::{StockValuationReport, WarehouseStock};
pub use transaction::TransactionReport;
