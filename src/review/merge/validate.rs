use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::review::merge::config::ColumnNames;
use crate::review::merge::error::{MergeError, Result};
use crate::review::merge::io::excel_read;
use crate::review::merge::model::RowSet;

/// Checks that the input set is usable before anything is merged: at least one
/// workbook, and every workbook readable and carrying all required columns.
#[instrument(level = "info", skip_all, fields(file_count = paths.len()))]
pub fn validate_paths(paths: &[PathBuf], columns: &ColumnNames) -> Result<()> {
    if paths.is_empty() {
        return Err(MergeError::NoInputFiles);
    }

    for path in paths {
        if !path.exists() {
            return Err(MergeError::MissingInput(path.clone()));
        }
        let row_set = excel_read::read_row_set(path)?;
        check_columns(&row_set, columns)?;
        debug!(path = %path.display(), "workbook passed validation");
    }

    Ok(())
}

/// Fails with [`MergeError::MissingColumns`] when `row_set` lacks any of the
/// required columns.
pub fn check_columns(row_set: &RowSet, columns: &ColumnNames) -> Result<()> {
    let required = columns.required();
    let missing: Vec<String> = required
        .into_iter()
        .filter(|name| !row_set.has_column(name))
        .map(String::from)
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(MergeError::MissingColumns {
        path: row_set.source.clone(),
        missing,
        required: required.into_iter().map(String::from).collect(),
    })
}
