//! Filter flags shared by the list and report commands
//!
//! Flags and `--view` feed the same [`ViewState`]; a flag given alongside
//! `--view` overrides the matching query parameter.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use crate::config::Settings;
use crate::error::{BranchbookError, BranchbookResult};
use crate::export::{write_report, CsvReport, ExportFormat};
use crate::reports::FilterCriteria;
use crate::services::WarehouseService;
use crate::storage::DataStore;
use crate::view::{StoreLookup, ViewState};

/// Filter flags
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Start date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// End date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Branch name or ID
    #[arg(long)]
    pub branch: Option<String>,

    /// Category name or ID
    #[arg(long)]
    pub category: Option<String>,

    /// User ID
    #[arg(long)]
    pub user: Option<String>,

    /// Warehouse name or ID
    #[arg(long)]
    pub warehouse: Option<String>,

    /// Case-insensitive text search
    #[arg(short, long)]
    pub query: Option<String>,

    /// View state as a URL query string, e.g. "branch=North&dateFrom=2025-01-01"
    #[arg(long)]
    pub view: Option<String>,
}

impl FilterArgs {
    /// Merge `--view` and the individual flags
    pub fn view_state(&self, settings: &Settings) -> ViewState {
        let mut state = match &self.view {
            Some(query) => ViewState::from_query(query, settings.default_page_limit),
            None => ViewState::with_default_limit(settings.default_page_limit),
        };

        if self.from.is_some() || self.to.is_some() {
            state = state.with_dates(
                self.from.as_deref().or(state.date_from.as_deref()),
                self.to.as_deref().or(state.date_to.as_deref()),
            );
        }
        if let Some(branch) = &self.branch {
            state = state.with_branch(Some(branch));
        }
        if let Some(category) = &self.category {
            state = state.with_category(Some(category));
        }
        if let Some(user) = &self.user {
            state = state.with_user(Some(user));
        }
        if let Some(query) = &self.query {
            state = state.with_query(Some(query));
        }

        state
    }

    /// Resolve the filters against the store
    pub fn criteria(&self, store: &dyn DataStore, settings: &Settings) -> BranchbookResult<FilterCriteria> {
        let mut criteria = self.view_state(settings).criteria(&StoreLookup::new(store))?;

        if let Some(warehouse) = &self.warehouse {
            criteria.warehouse_id = Some(WarehouseService::new(store).resolve(warehouse)?.id);
        }

        Ok(criteria)
    }
}

/// Write a report to `path`, in `format` or the format implied by the
/// file extension
pub fn write_report_file<R: CsvReport + Serialize>(
    report: &R,
    path: &Path,
    format: Option<ExportFormat>,
) -> BranchbookResult<()> {
    let format = format.unwrap_or_else(|| ExportFormat::from_path(path));
    let file = File::create(path).map_err(|e| {
        BranchbookError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    write_report(report, format, &mut writer)?;
    println!("Report exported to: {} ({})", path.display(), format);
    Ok(())
}
