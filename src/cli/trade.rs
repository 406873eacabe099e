//! Purchase and sale CLI commands
//!
//! Items are given as `PRODUCT:QTY` or `PRODUCT:QTY@PRICE`, where PRODUCT
//! is a name, SKU or ID.

use clap::{Args, Subcommand};

use crate::display::format_trade_outcome;
use crate::error::{BranchbookError, BranchbookResult};
use crate::models::Money;
use crate::services::{CatalogService, ItemInput, ProcedureService, PurchaseInput, SaleInput, WarehouseService};
use crate::storage::{DataStore, JsonStore};

use super::stock::parse_user;

/// Fields shared by purchases and sales
#[derive(Args, Debug, Clone)]
pub struct TradeArgs {
    /// Warehouse name or ID
    #[arg(short, long)]
    pub warehouse: String,

    /// Line item, PRODUCT:QTY or PRODUCT:QTY@PRICE (repeatable)
    #[arg(short, long = "item", required = true)]
    pub items: Vec<String>,

    /// Date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<String>,

    /// Invoice or receipt number
    #[arg(short, long)]
    pub reference: Option<String>,

    /// Free-form note
    #[arg(short, long)]
    pub note: Option<String>,

    /// Recording user ID
    #[arg(long)]
    pub user: Option<String>,
}

/// Purchase subcommands
#[derive(Subcommand)]
pub enum PurchaseCommands {
    /// Record a purchase and add the items to stock
    Record {
        #[command(flatten)]
        trade: TradeArgs,
        /// Supplier name
        #[arg(short, long)]
        supplier: Option<String>,
    },
}

/// Sale subcommands
#[derive(Subcommand)]
pub enum SaleCommands {
    /// Record a sale and take the items out of stock
    Record {
        #[command(flatten)]
        trade: TradeArgs,
        /// Customer name
        #[arg(short, long)]
        customer: Option<String>,
        /// Record as an external sale
        #[arg(long)]
        external: bool,
    },
}

/// Split `PRODUCT:QTY[@PRICE]` into its parts
fn split_item(raw: &str) -> BranchbookResult<(&str, i64, Option<Money>)> {
    let invalid = || {
        BranchbookError::Validation(format!(
            "Invalid item '{}'. Use PRODUCT:QTY or PRODUCT:QTY@PRICE",
            raw
        ))
    };

    let (product, rest) = raw.rsplit_once(':').ok_or_else(invalid)?;
    let (qty, price) = match rest.split_once('@') {
        Some((q, p)) => (q, Some(Money::parse(p.trim()).map_err(|_| invalid())?)),
        None => (rest, None),
    };
    let qty = qty.trim().parse::<i64>().map_err(|_| invalid())?;

    let product = product.trim();
    if product.is_empty() {
        return Err(invalid());
    }

    Ok((product, qty, price))
}

fn parse_items(store: &dyn DataStore, raw_items: &[String]) -> BranchbookResult<Vec<ItemInput>> {
    let catalog = CatalogService::new(store);
    raw_items
        .iter()
        .map(|raw| {
            let (product, qty, price) = split_item(raw)?;
            let item = ItemInput::new(catalog.resolve_product(product)?.id, qty);
            Ok(match price {
                Some(p) => item.at(p),
                None => item,
            })
        })
        .collect()
}

/// Handle a purchase command
pub fn handle_purchase_command(store: &JsonStore, cmd: PurchaseCommands) -> BranchbookResult<()> {
    match cmd {
        PurchaseCommands::Record { trade, supplier } => {
            let warehouse = WarehouseService::new(store).resolve(&trade.warehouse)?;
            let mut input = PurchaseInput::new(warehouse.id, parse_items(store, &trade.items)?);
            input.date = trade.date;
            input.supplier = supplier.unwrap_or_default();
            input.reference = trade.reference.unwrap_or_default();
            input.note = trade.note.unwrap_or_default();
            input.user_id = parse_user(trade.user)?;

            let outcome = ProcedureService::new(store).record_purchase(input)?;
            println!("Recorded purchase into {}", warehouse.name);
            print!("{}", format_trade_outcome(&outcome));
        }
    }

    Ok(())
}

/// Handle a sale command
pub fn handle_sale_command(store: &JsonStore, cmd: SaleCommands) -> BranchbookResult<()> {
    match cmd {
        SaleCommands::Record {
            trade,
            customer,
            external,
        } => {
            let warehouse = WarehouseService::new(store).resolve(&trade.warehouse)?;
            let mut input = SaleInput::new(warehouse.id, parse_items(store, &trade.items)?);
            input.date = trade.date;
            input.customer = customer.unwrap_or_default();
            input.reference = trade.reference.unwrap_or_default();
            input.note = trade.note.unwrap_or_default();
            input.user_id = parse_user(trade.user)?;

            let outcome = ProcedureService::new(store).record_sale(input, external)?;
            println!("Recorded sale from {}", warehouse.name);
            print!("{}", format_trade_outcome(&outcome));
        }
    }

    Ok(())
}
