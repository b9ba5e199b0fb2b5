use std::collections::HashSet;
use std::path::Path;

use calamine::{DataType, Range, Reader, open_workbook_auto};
use tracing::debug;

use crate::review::merge::error::{MergeError, Result};
use crate::review::merge::model::{Cell, CellValue, RowSet, cell_text};

/// Loads the first worksheet of a workbook. The first row is the header; the
/// remaining non-empty rows become the data rows, in file order.
pub fn read_row_set(path: &Path) -> Result<RowSet> {
    let unreadable = |source: calamine::Error| MergeError::UnreadableInput {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(unreadable)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MergeError::EmptyWorkbook(path.to_path_buf()))?
        .map_err(unreadable)?;

    let row_set = range_to_row_set(path, &range);
    debug!(
        path = %path.display(),
        columns = row_set.columns.len(),
        rows = row_set.rows.len(),
        "loaded worksheet"
    );
    Ok(row_set)
}

fn range_to_row_set(path: &Path, range: &Range<DataType>) -> RowSet {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_text(&cell_to_value(Some(cell))).unwrap_or_default())
            .collect(),
        None => Vec::new(),
    };
    let columns = unique_headers(headers);

    let data = rows
        .map(|row| {
            (0..columns.len())
                .map(|col_idx| cell_to_value(row.get(col_idx)))
                .collect::<Vec<Cell>>()
        })
        .filter(|cells| cells.iter().any(Option::is_some))
        .collect();

    RowSet::new(path, columns, data)
}

/// Fills in blank headers and suffixes repeated ones with `.1`, `.2`, ... so
/// that columns can be addressed by name.
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());

    for (col_idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {col_idx}")
        } else {
            header
        };

        let mut candidate = base.clone();
        let mut counter = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{counter}");
            counter += 1;
        }
        seen.insert(candidate.clone());
        columns.push(candidate);
    }

    columns
}

/// Keeps the cell typed: numbers stay numbers and date-formatted cells become
/// date-times, so the summary can write them back unchanged.
fn cell_to_value(cell: Option<&DataType>) -> Cell {
    match cell {
        Some(DataType::String(value)) if value.is_empty() => None,
        Some(DataType::String(value)) => Some(CellValue::Text(value.clone())),
        Some(DataType::Float(value)) => Some(CellValue::Number(*value)),
        Some(DataType::Int(value)) => Some(CellValue::Number(*value as f64)),
        Some(DataType::Bool(value)) => Some(CellValue::Bool(*value)),
        Some(other @ DataType::DateTime(_)) => Some(
            other
                .as_datetime()
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(other.to_string())),
        ),
        Some(DataType::Empty) | Some(DataType::Error(_)) | None => None,
        Some(other) => Some(CellValue::Text(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn numbers_stay_numeric() {
        assert_eq!(
            cell_to_value(Some(&DataType::Float(101.0))),
            Some(CellValue::Number(101.0))
        );
        assert_eq!(
            cell_to_value(Some(&DataType::Int(42))),
            Some(CellValue::Number(42.0))
        );
        let code = cell_to_value(Some(&DataType::Float(101.0)));
        assert_eq!(cell_text(&code).as_deref(), Some("101"));
    }

    #[test]
    fn date_serials_become_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid date");

        assert_eq!(
            cell_to_value(Some(&DataType::DateTime(45366.0))),
            Some(CellValue::DateTime(expected))
        );
    }

    #[test]
    fn empty_strings_are_null() {
        assert_eq!(cell_to_value(Some(&DataType::String(String::new()))), None);
        assert_eq!(
            cell_to_value(Some(&DataType::String(" ".into()))),
            Some(CellValue::Text(" ".into()))
        );
        assert_eq!(cell_to_value(Some(&DataType::Empty)), None);
    }

    #[test]
    fn repeated_and_blank_headers_are_renamed() {
        let columns = unique_headers(vec![
            "code".into(),
            "note".into(),
            String::new(),
            "note".into(),
            "note".into(),
        ]);

        assert_eq!(columns, vec!["code", "note", "Unnamed: 2", "note.1", "note.2"]);
    }
}
