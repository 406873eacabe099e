//! Stock and stock audit CLI commands

use std::collections::HashMap;

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_audit_details, format_audit_list, format_low_stock, format_stock_list};
use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{AuditStatus, StockAuditId, UserId, WarehouseId};
use crate::services::{CatalogService, ProcedureService, StockService, SubmitAuditInput, WarehouseService};
use crate::storage::{DataStore, JsonStore};

use super::match_id;

/// Stock subcommands
#[derive(Subcommand)]
pub enum StockCommands {
    /// List stock levels
    List {
        /// Warehouse name or ID
        #[arg(short, long)]
        warehouse: Option<String>,
    },
    /// Show products at or below their minimum stock level
    Low {
        /// Warehouse name or ID
        #[arg(short, long)]
        warehouse: Option<String>,
    },
}

/// Stock audit subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// Submit a physical count for review
    Submit {
        /// Product name, SKU or ID
        #[arg(short, long)]
        product: String,
        /// Warehouse name or ID
        #[arg(short, long)]
        warehouse: String,
        /// Quantity counted
        #[arg(short, long)]
        counted: i64,
        /// Note for the reviewer
        #[arg(short, long)]
        note: Option<String>,
        /// Submitting user ID
        #[arg(long)]
        user: Option<String>,
    },
    /// List stock audits
    List {
        /// Filter by status (pending, approved, rejected)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Approve a pending audit and set stock to the counted quantity
    Approve {
        /// Audit ID
        id: String,
        /// Reviewing user ID
        #[arg(long)]
        user: Option<String>,
    },
    /// Reject a pending audit
    Reject {
        /// Audit ID
        id: String,
        /// Reason for the rejection
        #[arg(short, long)]
        reason: String,
        /// Reviewing user ID
        #[arg(long)]
        user: Option<String>,
    },
}

fn warehouse_names(store: &dyn DataStore) -> BranchbookResult<HashMap<WarehouseId, String>> {
    Ok(WarehouseService::new(store)
        .list()?
        .into_iter()
        .map(|w| (w.id, w.name))
        .collect())
}

fn resolve_warehouse(store: &dyn DataStore, warehouse: Option<String>) -> BranchbookResult<Option<WarehouseId>> {
    warehouse
        .map(|w| WarehouseService::new(store).resolve(&w).map(|w| w.id))
        .transpose()
}

pub(crate) fn parse_user(user: Option<String>) -> BranchbookResult<Option<UserId>> {
    user.map(|u| {
        u.parse::<UserId>()
            .map_err(|_| BranchbookError::Validation(format!("Invalid user id '{}'", u)))
    })
    .transpose()
}

/// Accepts the full id or the short form shown in listings
fn resolve_audit_id(store: &dyn DataStore, id: &str) -> BranchbookResult<StockAuditId> {
    let audits = StockService::new(store).audits(None)?;
    let audit = match_id(&audits, id, "aud-", |a| a.id.to_full_string(), "Stock audit")?;
    Ok(audit.id)
}

fn parse_status(status: &str) -> BranchbookResult<AuditStatus> {
    match status.trim().to_lowercase().as_str() {
        "pending" => Ok(AuditStatus::Pending),
        "approved" => Ok(AuditStatus::Approved),
        "rejected" => Ok(AuditStatus::Rejected),
        other => Err(BranchbookError::Validation(format!(
            "Invalid audit status '{}'. Valid statuses: pending, approved, rejected",
            other
        ))),
    }
}

/// Handle a stock command
pub fn handle_stock_command(store: &dyn DataStore, settings: &Settings, cmd: StockCommands) -> BranchbookResult<()> {
    let service = StockService::new(store);

    match cmd {
        StockCommands::List { warehouse } => {
            let rows = service.list(resolve_warehouse(store, warehouse)?)?;
            println!("{}", format_stock_list(&rows, &warehouse_names(store)?));
        }
        StockCommands::Low { warehouse } => {
            let items = service.low_stock(resolve_warehouse(store, warehouse)?, settings.low_stock_default)?;
            print!("{}", format_low_stock(&items, &warehouse_names(store)?));
        }
    }

    Ok(())
}

/// Handle a stock audit command
pub fn handle_audit_command(store: &JsonStore, cmd: AuditCommands) -> BranchbookResult<()> {
    let procedures = ProcedureService::new(store);

    match cmd {
        AuditCommands::Submit {
            product,
            warehouse,
            counted,
            note,
            user,
        } => {
            let product = CatalogService::new(store).resolve_product(&product)?;
            let warehouse = WarehouseService::new(store).resolve(&warehouse)?;
            let audit = procedures.submit_stock_audit(SubmitAuditInput {
                product_id: product.id,
                warehouse_id: warehouse.id,
                counted_quantity: counted,
                submitted_by: parse_user(user)?,
                note: note.unwrap_or_default(),
            })?;
            println!("Submitted stock audit for {} in {}", product.name, warehouse.name);
            print!("{}", format_audit_details(&audit));
        }
        AuditCommands::List { status } => {
            let status = status.as_deref().map(parse_status).transpose()?;
            let audits = StockService::new(store).audits(status)?;
            let products: HashMap<_, _> = CatalogService::new(store)
                .list_products()?
                .into_iter()
                .map(|p| (p.id, p.name))
                .collect();
            println!("{}", format_audit_list(&audits, &products, &warehouse_names(store)?));
        }
        AuditCommands::Approve { id, user } => {
            let audit = procedures.approve_stock_audit(resolve_audit_id(store, &id)?, parse_user(user)?)?;
            println!("Approved stock audit; stock set to {}", audit.counted_quantity);
            print!("{}", format_audit_details(&audit));
        }
        AuditCommands::Reject { id, reason, user } => {
            let audit = procedures.reject_stock_audit(resolve_audit_id(store, &id)?, parse_user(user)?, &reason)?;
            println!("Rejected stock audit");
            print!("{}", format_audit_details(&audit));
        }
    }

    Ok(())
}
