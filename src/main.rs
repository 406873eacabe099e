use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use branchbook::cli::{
    handle_audit_command, handle_branch_command, handle_call_command, handle_category_command,
    handle_product_command, handle_purchase_command, handle_record_command, handle_report_command,
    handle_sale_command, handle_stock_command, handle_warehouse_command, CallArgs,
};
use branchbook::config::{paths::BranchbookPaths, settings::Settings};
use branchbook::export::{export_full_json, export_full_yaml, export_records_csv, ExportFormat};
use branchbook::reports::FilterCriteria;
use branchbook::storage::{initialize_storage, needs_initialization, JsonStore};

#[derive(Parser)]
#[command(
    name = "branchbook",
    version,
    about = "Multi-branch retail and inventory ledger",
    long_about = "branchbook keeps sales, purchases, expenses and stock for several \
                  branches and warehouses in a local data store, and reports on them \
                  by branch and over time."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Branch management commands
    #[command(subcommand)]
    Branch(branchbook::cli::BranchCommands),

    /// Warehouse management commands
    #[command(subcommand)]
    Warehouse(branchbook::cli::WarehouseCommands),

    /// Product category commands
    #[command(subcommand)]
    Category(branchbook::cli::CategoryCommands),

    /// Product catalog commands
    #[command(subcommand)]
    Product(branchbook::cli::ProductCommands),

    /// Stock levels
    #[command(subcommand)]
    Stock(branchbook::cli::StockCommands),

    /// Stock audits (physical counts awaiting approval)
    #[command(subcommand)]
    Audit(branchbook::cli::AuditCommands),

    /// Sales, purchases and expenses
    #[command(subcommand, alias = "rec")]
    Record(branchbook::cli::RecordCommands),

    /// Record purchases into a warehouse
    #[command(subcommand)]
    Purchase(branchbook::cli::PurchaseCommands),

    /// Record sales out of a warehouse
    #[command(subcommand)]
    Sale(branchbook::cli::SaleCommands),

    /// Reports
    #[command(subcommand)]
    Report(branchbook::cli::ReportCommands),

    /// Invoke a stored procedure with JSON arguments
    Call(CallArgs),

    /// Export the whole data store (json or yaml) or every record (csv)
    Export {
        /// Output file
        output: PathBuf,
        /// Format (csv, json, yaml); defaults to the file extension
        #[arg(long)]
        format: Option<String>,
    },

    /// Show recent writes from the audit log
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },

    /// Initialize the data store with a main branch and default categories
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_env("BRANCHBOOK_LOG")
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("branchbook=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = BranchbookPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(&settings);

    let store = JsonStore::open(paths.clone())?;

    match cli.command {
        Some(Commands::Branch(cmd)) => handle_branch_command(&store, cmd)?,
        Some(Commands::Warehouse(cmd)) => handle_warehouse_command(&store, cmd)?,
        Some(Commands::Category(cmd)) => handle_category_command(&store, cmd)?,
        Some(Commands::Product(cmd)) => handle_product_command(&store, &settings, cmd)?,
        Some(Commands::Stock(cmd)) => handle_stock_command(&store, &settings, cmd)?,
        Some(Commands::Audit(cmd)) => handle_audit_command(&store, cmd)?,
        Some(Commands::Record(cmd)) => handle_record_command(&store, &settings, cmd)?,
        Some(Commands::Purchase(cmd)) => handle_purchase_command(&store, cmd)?,
        Some(Commands::Sale(cmd)) => handle_sale_command(&store, cmd)?,
        Some(Commands::Report(cmd)) => handle_report_command(&store, &settings, cmd)?,
        Some(Commands::Call(cmd)) => {
            let procedure = cmd.procedure.clone();
            if !handle_call_command(&store, cmd)? {
                bail!("Procedure '{}' returned an error", procedure);
            }
        }
        Some(Commands::Export { output, format }) => {
            let format = match format {
                Some(f) => f.parse::<ExportFormat>()?,
                None => ExportFormat::from_path(&output),
            };

            let file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let mut writer = BufWriter::new(file);

            match format {
                ExportFormat::Json => export_full_json(&store, &mut writer, true)?,
                ExportFormat::Yaml => export_full_yaml(&store, &mut writer)?,
                ExportFormat::Csv => {
                    let rows = export_records_csv(&store, &[], &FilterCriteria::new(), &mut writer)?;
                    println!("{} record(s) written", rows);
                }
            }
            writer.flush()?;
            println!("Exported {} to: {}", format, output.display());
        }
        Some(Commands::History { count }) => {
            let entries = store.audit_log().read_recent(count)?;
            if entries.is_empty() {
                println!("No history yet.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
        Some(Commands::Init) => {
            println!("Initializing branchbook at: {}", paths.base_dir().display());
            initialize_storage(&store)?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Created 'Main Branch' with 'Main Warehouse' and the default product categories.");
            println!();
            println!("Run 'branchbook product add <name> --cost <c> --price <p>' to start the catalog.");
        }
        Some(Commands::Config) => {
            println!("branchbook Configuration");
            println!("========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!("Initialized:      {}", !needs_initialization(&store));
            println!();
            println!("Settings:");
            println!("  Currency symbol:   {}", settings.currency_symbol);
            println!("  Page limit:        {}", settings.default_page_limit);
            println!("  Default bucket:    {}", settings.default_bucket);
            println!("  Low stock default: {}", settings.low_stock_default);
            println!("  Log level:         {}", settings.log_level);
        }
        None => {
            println!("branchbook - multi-branch retail and inventory ledger");
            println!();
            println!("Run 'branchbook --help' for usage information.");
            println!("Run 'branchbook init' to create the data store.");
        }
    }

    Ok(())
}
