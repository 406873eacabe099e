//! File-backed data store
//!
//! Each table lives in `data/<table>.json` as `{"rows": [...]}`. Tables are
//! loaded lazily and cached behind an `RwLock`. Writes go through
//! `JsonStore::transaction`, which works on a copy of the touched tables and
//! only replaces the files, the cache and the audit log when the closure
//! succeeds.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::BranchbookPaths;
use crate::error::{BranchbookError, BranchbookResult};

use super::file_io::{read_json, stage_json, StagedFile};
use super::store::{describe, from_row, matches_all, to_row, DataStore, Filter, ProcedureResponse, Row};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Serialize)]
struct TableFileRef<'a> {
    rows: &'a [Row],
}

fn validate_table_name(table: &str) -> BranchbookResult<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(BranchbookError::Validation(format!(
            "Invalid table name '{}'",
            table
        )))
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> BranchbookError {
    BranchbookError::Storage(format!("Failed to acquire table lock: {}", e))
}

/// JSON-file implementation of `DataStore`
pub struct JsonStore {
    paths: BranchbookPaths,
    tables: RwLock<HashMap<String, Vec<Row>>>,
    audit: AuditLogger,
}

impl JsonStore {
    /// Open a store rooted at `paths`, creating directories as needed
    pub fn open(paths: BranchbookPaths) -> BranchbookResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            tables: RwLock::new(HashMap::new()),
            paths,
        })
    }

    pub fn paths(&self) -> &BranchbookPaths {
        &self.paths
    }

    pub fn audit_log(&self) -> &AuditLogger {
        &self.audit
    }

    /// Drop cached tables so the next read goes to disk
    pub fn invalidate(&self) -> BranchbookResult<()> {
        self.tables.write().map_err(lock_error)?.clear();
        Ok(())
    }

    /// Run `f` against a working copy of the tables.
    ///
    /// Nothing is written unless `f` returns `Ok`. Every touched table file is
    /// staged before any of them is renamed into place.
    pub fn transaction<R, F>(&self, f: F) -> BranchbookResult<R>
    where
        F: FnOnce(&mut Tables<'_>) -> BranchbookResult<R>,
    {
        let mut cache = self.tables.write().map_err(lock_error)?;

        let mut tx = Tables {
            paths: &self.paths,
            base: &mut cache,
            working: HashMap::new(),
            dirty: BTreeSet::new(),
            journal: Vec::new(),
        };

        let result = f(&mut tx)?;

        let Tables {
            mut working,
            dirty,
            journal,
            ..
        } = tx;

        if dirty.is_empty() {
            return Ok(result);
        }

        let mut staged: Vec<StagedFile> = Vec::with_capacity(dirty.len());
        for name in &dirty {
            let rows = working.get(name).map(Vec::as_slice).unwrap_or(&[]);
            match stage_json(self.paths.table_file(name), &TableFileRef { rows }) {
                Ok(file) => staged.push(file),
                Err(e) => {
                    staged.into_iter().for_each(StagedFile::discard);
                    return Err(e);
                }
            }
        }

        for file in staged {
            file.commit()?;
        }

        for name in dirty {
            if let Some(rows) = working.remove(&name) {
                cache.insert(name, rows);
            }
        }
        drop(cache);

        debug!(entries = journal.len(), "committed store transaction");
        // the rows are on disk; a failed audit append must not report the write as failed
        if let Err(e) = self.audit.log_batch(&journal) {
            warn!(error = %e, entries = journal.len(), "failed to append audit log after commit");
        }

        Ok(result)
    }

    fn cached_select(&self, table: &str, columns: &[&str], filters: &[Filter]) -> BranchbookResult<Option<Vec<Row>>> {
        let cache = self.tables.read().map_err(lock_error)?;
        Ok(cache
            .get(table)
            .map(|rows| select_rows(rows, columns, filters)))
    }
}

fn select_rows(rows: &[Row], columns: &[&str], filters: &[Filter]) -> Vec<Row> {
    rows.iter()
        .filter(|row| matches_all(row, filters))
        .map(|row| {
            if columns.is_empty() {
                row.clone()
            } else {
                columns
                    .iter()
                    .filter_map(|c| row.get(*c).map(|v| (c.to_string(), v.clone())))
                    .collect()
            }
        })
        .collect()
}

/// Working copy of the tables inside a transaction
pub struct Tables<'a> {
    paths: &'a BranchbookPaths,
    base: &'a mut HashMap<String, Vec<Row>>,
    working: HashMap<String, Vec<Row>>,
    dirty: BTreeSet<String>,
    journal: Vec<AuditEntry>,
}

impl<'a> Tables<'a> {
    fn rows(&mut self, table: &str) -> BranchbookResult<&mut Vec<Row>> {
        validate_table_name(table)?;

        if !self.working.contains_key(table) {
            if !self.base.contains_key(table) {
                let file: TableFile = read_json(self.paths.table_file(table))?;
                self.base.insert(table.to_string(), file.rows);
            }
            let copy = self.base.get(table).cloned().unwrap_or_default();
            self.working.insert(table.to_string(), copy);
        }

        self.working
            .get_mut(table)
            .ok_or_else(|| BranchbookError::Storage(format!("Table '{}' not loaded", table)))
    }

    pub fn select(&mut self, table: &str, columns: &[&str], filters: &[Filter]) -> BranchbookResult<Vec<Row>> {
        Ok(select_rows(self.rows(table)?, columns, filters))
    }

    pub fn insert(&mut self, table: &str, mut payload: Row) -> BranchbookResult<Row> {
        let id = match payload.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Null) | None => {
                let id = Uuid::new_v4().to_string();
                payload.insert("id".into(), Value::String(id.clone()));
                id
            }
            Some(other) => {
                return Err(BranchbookError::Validation(format!(
                    "Row id must be a string, got {}",
                    other
                )))
            }
        };
        payload
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let rows = self.rows(table)?;
        if rows.iter().any(|r| r.get("id") == Some(&Value::String(id.clone()))) {
            return Err(BranchbookError::Duplicate {
                entity_type: "Row",
                identifier: format!("{}/{}", table, id),
            });
        }
        rows.push(payload.clone());

        self.dirty.insert(table.to_string());
        self.journal
            .push(AuditEntry::insert(table, &Value::Object(payload.clone())));
        debug!(table, id = %id, "inserted row");
        Ok(payload)
    }

    pub fn update(&mut self, table: &str, payload: Row, filters: &[Filter]) -> BranchbookResult<Row> {
        if filters.is_empty() {
            return Err(BranchbookError::Validation(
                "Refusing to update without a match condition".into(),
            ));
        }

        let rows = self.rows(table)?;
        let positions: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_all(row, filters))
            .map(|(i, _)| i)
            .collect();

        let index = match positions.as_slice() {
            [] => return Err(BranchbookError::row_not_found(describe(table, filters))),
            [single] => *single,
            many => {
                return Err(BranchbookError::Validation(format!(
                    "Update matched {} rows in {}",
                    many.len(),
                    describe(table, filters)
                )))
            }
        };

        let before = rows[index].clone();
        if let Some(new_id) = payload.get("id") {
            if before.get("id") != Some(new_id) {
                return Err(BranchbookError::Validation("Row id cannot be changed".into()));
            }
        }

        let row = &mut rows[index];
        for (key, value) in payload {
            row.insert(key, value);
        }
        let after = row.clone();

        self.dirty.insert(table.to_string());
        self.journal.push(AuditEntry::update(
            table,
            &Value::Object(before),
            &Value::Object(after.clone()),
        ));
        Ok(after)
    }

    pub fn delete(&mut self, table: &str, filters: &[Filter]) -> BranchbookResult<usize> {
        if filters.is_empty() {
            return Err(BranchbookError::Validation(
                "Refusing to delete without a match condition".into(),
            ));
        }

        let rows = self.rows(table)?;
        let (removed, kept): (Vec<Row>, Vec<Row>) = rows
            .drain(..)
            .partition(|row| matches_all(row, filters));
        *rows = kept;

        if removed.is_empty() {
            return Err(BranchbookError::row_not_found(describe(table, filters)));
        }

        self.dirty.insert(table.to_string());
        for row in &removed {
            self.journal
                .push(AuditEntry::delete(table, &Value::Object(row.clone())));
        }
        Ok(removed.len())
    }

    pub fn select_as<T: DeserializeOwned>(&mut self, table: &str, filters: &[Filter]) -> BranchbookResult<Vec<T>> {
        self.select(table, &[], filters)?
            .into_iter()
            .map(|row| from_row(table, row))
            .collect()
    }

    pub fn find_as<T: DeserializeOwned>(&mut self, table: &str, filters: &[Filter]) -> BranchbookResult<Option<T>> {
        Ok(self.select_as(table, filters)?.into_iter().next())
    }

    pub fn insert_as<T: Serialize + DeserializeOwned>(&mut self, table: &str, value: &T) -> BranchbookResult<T> {
        let row = self.insert(table, to_row(value)?)?;
        from_row(table, row)
    }

    /// Replace the row with the same `id` as `value`
    pub fn save_as<T: Serialize + DeserializeOwned>(&mut self, table: &str, value: &T) -> BranchbookResult<T> {
        let row = to_row(value)?;
        let id = row
            .get("id")
            .cloned()
            .ok_or_else(|| BranchbookError::Validation("Row has no id".into()))?;
        let updated = self.update(table, row, &[Filter { column: "id".into(), value: id }])?;
        from_row(table, updated)
    }
}

impl DataStore for JsonStore {
    fn select(&self, table: &str, columns: &[&str], filters: &[Filter]) -> BranchbookResult<Vec<Row>> {
        validate_table_name(table)?;
        if let Some(rows) = self.cached_select(table, columns, filters)? {
            return Ok(rows);
        }
        self.transaction(|tx| tx.select(table, columns, filters))
    }

    fn insert(&self, table: &str, payload: Row) -> BranchbookResult<Row> {
        self.transaction(|tx| tx.insert(table, payload))
    }

    fn update(&self, table: &str, payload: Row, filters: &[Filter]) -> BranchbookResult<Row> {
        self.transaction(|tx| tx.update(table, payload, filters))
    }

    fn delete(&self, table: &str, filters: &[Filter]) -> BranchbookResult<usize> {
        self.transaction(|tx| tx.delete(table, filters))
    }

    fn call(&self, procedure: &str, args: Value) -> BranchbookResult<ProcedureResponse> {
        let response = crate::services::procedures::dispatch(self, procedure, args)?;
        if !response.is_success() {
            warn!(procedure, message = %response.message, "procedure rejected");
        }
        Ok(response)
    }
}
