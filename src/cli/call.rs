//! Raw procedure calls through the data store

use clap::Args;
use serde_json::Value;

use crate::error::{BranchbookError, BranchbookResult};
use crate::storage::DataStore;

/// Arguments for `call`
#[derive(Args)]
pub struct CallArgs {
    /// Procedure name, e.g. approve_stock_audit
    pub procedure: String,

    /// Arguments as a JSON object
    #[arg(default_value = "{}")]
    pub args: String,
}

/// Run a procedure and print its response envelope as JSON.
///
/// Returns whether the procedure reported success.
pub fn handle_call_command(store: &dyn DataStore, cmd: CallArgs) -> BranchbookResult<bool> {
    let args: Value = serde_json::from_str(&cmd.args).map_err(|e| {
        BranchbookError::Validation(format!("Arguments must be a JSON object: {}", e))
    })?;
    if !args.is_object() {
        return Err(BranchbookError::Validation(
            "Arguments must be a JSON object".into(),
        ));
    }

    let response = store.call(&cmd.procedure, args)?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(response.is_success())
}
