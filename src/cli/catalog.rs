//! Category and product CLI commands

use std::collections::HashMap;

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_category_list, format_product_details, format_product_list};
use crate::error::{BranchbookError, BranchbookResult};
use crate::models::{Money, Product};
use crate::services::CatalogService;
use crate::storage::DataStore;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a new product category
    Add {
        /// Category name
        name: String,
    },
    /// List categories with product counts
    List,
}

/// Product subcommands
#[derive(Subcommand)]
pub enum ProductCommands {
    /// Add a product to the catalog
    Add {
        /// Product name
        name: String,
        /// Purchase price (e.g., "12.50")
        #[arg(long)]
        cost: String,
        /// Selling price (e.g., "18.00")
        #[arg(long)]
        price: String,
        /// Stock keeping unit code
        #[arg(long)]
        sku: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// Minimum stock level (defaults to the low_stock_default setting)
        #[arg(long)]
        min: Option<i64>,
    },
    /// List products
    List {
        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show product details
    Show {
        /// Product name, SKU or ID
        product: String,
    },
}

fn parse_money(field: &str, value: &str) -> BranchbookResult<Money> {
    Money::parse(value).map_err(|e| {
        BranchbookError::Validation(format!(
            "Invalid {} '{}'. Use format like '12.50' or '12'. Error: {}",
            field, value, e
        ))
    })
}

/// Handle a category command
pub fn handle_category_command(store: &dyn DataStore, cmd: CategoryCommands) -> BranchbookResult<()> {
    let service = CatalogService::new(store);

    match cmd {
        CategoryCommands::Add { name } => {
            let category = service.create_category(&name)?;
            println!("Created category: {}", category.name);
            println!("  ID: {}", category.id);
        }
        CategoryCommands::List => {
            let products = service.list_products()?;
            print!("{}", format_category_list(&service.list_categories()?, &products));
        }
    }

    Ok(())
}

/// Handle a product command
pub fn handle_product_command(
    store: &dyn DataStore,
    settings: &Settings,
    cmd: ProductCommands,
) -> BranchbookResult<()> {
    let service = CatalogService::new(store);

    match cmd {
        ProductCommands::Add {
            name,
            cost,
            price,
            sku,
            category,
            min,
        } => {
            let mut product = Product::new(
                name,
                parse_money("cost", &cost)?,
                parse_money("price", &price)?,
            );
            product.sku = sku.unwrap_or_default();
            product.min_stock = min.unwrap_or(settings.low_stock_default);
            product.category_id = category
                .map(|c| service.resolve_category(&c))
                .transpose()?
                .map(|c| c.id);

            let product = service.create_product(product)?;
            println!("Created product: {}", product);
            println!("  ID: {}", product.id);
        }
        ProductCommands::List { category } => {
            let products = match category {
                Some(c) => service.products_in_category(service.resolve_category(&c)?.id)?,
                None => service.list_products()?,
            };
            let names: HashMap<_, _> = service
                .list_categories()?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect();
            println!("{}", format_product_list(&products, &names));
        }
        ProductCommands::Show { product } => {
            let product = service.resolve_product(&product)?;
            let category = product
                .category_id
                .map(|id| service.get_category(id))
                .transpose()?
                .flatten();
            print!(
                "{}",
                format_product_details(&product, category.as_ref().map(|c| c.name.as_str()))
            );
        }
    }

    Ok(())
}
