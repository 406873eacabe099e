//! Branch and warehouse CLI commands

use clap::Subcommand;

use crate::display::{format_branch_list, format_warehouse_list};
use crate::error::BranchbookResult;
use crate::services::{BranchService, WarehouseService};
use crate::storage::DataStore;

/// Branch subcommands
#[derive(Subcommand)]
pub enum BranchCommands {
    /// Create a new branch
    Add {
        /// Branch name
        name: String,
        /// Street address
        #[arg(short, long)]
        address: Option<String>,
    },
    /// List all branches
    List,
}

/// Warehouse subcommands
#[derive(Subcommand)]
pub enum WarehouseCommands {
    /// Create a new warehouse
    Add {
        /// Warehouse name
        name: String,
        /// Owning branch name or ID
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// List warehouses
    List {
        /// Only warehouses of this branch
        #[arg(short, long)]
        branch: Option<String>,
    },
}

/// Handle a branch command
pub fn handle_branch_command(store: &dyn DataStore, cmd: BranchCommands) -> BranchbookResult<()> {
    let service = BranchService::new(store);

    match cmd {
        BranchCommands::Add { name, address } => {
            let branch = service.create(&name, address.as_deref())?;
            println!("Created branch: {}", branch.name);
            println!("  ID: {}", branch.id);
        }
        BranchCommands::List => {
            let warehouses = WarehouseService::new(store).list()?;
            println!("{}", format_branch_list(&service.list()?, &warehouses));
        }
    }

    Ok(())
}

/// Handle a warehouse command
pub fn handle_warehouse_command(store: &dyn DataStore, cmd: WarehouseCommands) -> BranchbookResult<()> {
    let service = WarehouseService::new(store);
    let branches = BranchService::new(store);

    match cmd {
        WarehouseCommands::Add { name, branch } => {
            let branch = branch.map(|b| branches.resolve(&b)).transpose()?;
            let warehouse = service.create(&name, branch.as_ref().map(|b| b.id))?;
            println!("Created warehouse: {}", warehouse.name);
            if let Some(branch) = branch {
                println!("  Branch: {}", branch.name);
            }
            println!("  ID: {}", warehouse.id);
        }
        WarehouseCommands::List { branch } => {
            let warehouses = match branch {
                Some(b) => service.list_for_branch(branches.resolve(&b)?.id)?,
                None => service.list()?,
            };
            println!("{}", format_warehouse_list(&warehouses, &branches.names()?));
        }
    }

    Ok(())
}
