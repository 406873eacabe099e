//! YAML snapshot export
//!
//! Same document as the JSON export, with a comment header.

use std::io::Write;

use crate::error::{BranchbookError, BranchbookResult};
use crate::export::json::FullExport;
use crate::storage::DataStore;

/// Export the full data store to YAML
pub fn export_full_yaml<W: Write>(store: &dyn DataStore, writer: &mut W) -> BranchbookResult<()> {
    let export = FullExport::from_store(store)?;

    let header = format!(
        "# branchbook data export\n# Generated: {}\n# App Version: {}\n\n",
        export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| BranchbookError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| BranchbookError::Export(e.to_string()))?;

    Ok(())
}

/// Parse and check a YAML export
pub fn import_from_yaml(yaml_str: &str) -> BranchbookResult<FullExport> {
    let export: FullExport = serde_yaml::from_str(yaml_str)
        .map_err(|e| BranchbookError::Validation(format!("Invalid YAML export: {}", e)))?;

    export.validate().map_err(BranchbookError::Validation)?;

    Ok(export)
}
