use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::debug;

use crate::review::merge::config::DEFAULT_SHEET_NAME;
use crate::review::merge::error::Result;
use crate::review::merge::model::{CellValue, OutputTable};

/// Writes the summary table to `path` as a single-sheet workbook.
///
/// Numbers, booleans and dates keep their type; date-times are written with a
/// date format. Cells whose column is `wrap_column` are written with text
/// wrapping so that multi-line opinions stay readable. The workbook is
/// rendered in memory and moved into place only once fully written, so a
/// failed save leaves nothing at `path`.
pub fn write_table(path: &Path, table: &OutputTable, wrap_column: Option<&str>) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sanitize_sheet_name(&table.sheet_name))?;

    let wrap_index = wrap_column.and_then(|name| table.column_index(name));
    let formats = CellFormats::new();

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let Some(value) = cell else {
                continue;
            };
            let wrap = Some(col_idx) == wrap_index;
            write_cell(worksheet, excel_row, col_idx as u16, value, wrap, &formats)?;
        }
    }

    if !table.columns.is_empty() {
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.autofilter(0, 0, table.rows.len() as u32, col_end)?;
    }

    let buffer = workbook.save_to_buffer()?;
    persist(path, &buffer)?;
    debug!(path = %path.display(), bytes = buffer.len(), "workbook written");
    Ok(())
}

struct CellFormats {
    wrap: Format,
    date: Format,
    datetime: Format,
}

impl CellFormats {
    fn new() -> Self {
        Self {
            wrap: Format::new().set_text_wrap(),
            date: Format::new().set_num_format("yyyy-mm-dd"),
            datetime: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
        }
    }
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    wrap: bool,
    formats: &CellFormats,
) -> Result<()> {
    match value {
        CellValue::Text(text) if text.is_empty() => {}
        CellValue::Text(text) if wrap => {
            worksheet.write_string_with_format(row, col, text, &formats.wrap)?;
        }
        CellValue::Text(text) => {
            worksheet.write_string(row, col, text)?;
        }
        CellValue::Number(number) => {
            worksheet.write_number(row, col, *number)?;
        }
        CellValue::Bool(flag) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        CellValue::DateTime(datetime) => {
            let format = if CellValue::is_date_only(datetime) {
                &formats.date
            } else {
                &formats.datetime
            };
            worksheet.write_datetime_with_format(row, col, datetime, format)?;
        }
    }
    Ok(())
}

fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let staging = staging_path(path);
    if let Err(error) = fs::write(&staging, bytes).and_then(|()| fs::rename(&staging, path)) {
        let _ = fs::remove_file(&staging);
        return Err(error.into());
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Makes a worksheet name acceptable to Excel: no `: \ / ? * [ ]`, at most 31
/// characters, never blank.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let sanitized = sanitized.trim().trim_matches('\'');
    if sanitized.is_empty() {
        return DEFAULT_SHEET_NAME.to_string();
    }

    sanitized.chars().take(31).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_follow_excel_rules() {
        assert_eq!(sanitize_sheet_name("Q3/Q4 [draft]"), "Q3_Q4 _draft_");
        assert_eq!(sanitize_sheet_name("  "), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"가".repeat(40)).chars().count(), 31);
    }

    #[test]
    fn staging_file_sits_next_to_destination() {
        let staged = staging_path(Path::new("/tmp/out/summary.xlsx"));
        assert_eq!(staged, PathBuf::from("/tmp/out/summary.xlsx.partial"));
    }
}
