use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDateTime, NaiveTime};

use crate::review::merge::error::{MergeError, Result};

/// Typed content of a non-empty spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Plain text.
    Text(String),
    /// Any numeric cell that is not formatted as a date.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Date or date-time cell.
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Whether a date-time has no time-of-day component.
    pub fn is_date_only(value: &NaiveDateTime) -> bool {
        value.time() == NaiveTime::MIN
    }
}

/// Text form used to compare item codes and reviewers across workbooks.
/// Integral numbers render without a fractional part, so the number `101`
/// and the text `"101"` are the same key.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(value) => f.write_str(value),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Bool(value) => write!(f, "{value}"),
            CellValue::DateTime(value) if CellValue::is_date_only(value) => {
                write!(f, "{}", value.format("%Y-%m-%d"))
            }
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

/// A single spreadsheet cell. `None` stands for an empty cell.
pub type Cell = Option<CellValue>;

/// Text form of a cell, `None` for an empty one.
pub fn cell_text(cell: &Cell) -> Option<String> {
    cell.as_ref().map(ToString::to_string)
}

/// The rows of one input workbook, in file order, keyed by header name.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    /// Workbook the rows were loaded from.
    pub source: PathBuf,
    /// Header names. Every name is unique within the row set.
    pub columns: Vec<String>,
    /// Data rows. Each row holds exactly `columns.len()` cells.
    pub rows: Vec<Vec<Cell>>,
}

impl RowSet {
    pub fn new(source: impl Into<PathBuf>, columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            source: source.into(),
            columns,
            rows,
        }
    }

    /// Position of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Like [`RowSet::column_index`], but reports a missing column as an error.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| MergeError::MissingColumn {
            path: self.source.clone(),
            column: name.to_string(),
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Fails with [`MergeError::RaggedRow`] when a row does not hold one cell
    /// per column.
    pub fn check_shape(&self) -> Result<()> {
        let expected = self.columns.len();
        match self.rows.iter().position(|row| row.len() != expected) {
            Some(row_idx) => Err(MergeError::RaggedRow {
                path: self.source.clone(),
                row: row_idx + 2,
                expected,
                found: self.rows[row_idx].len(),
            }),
            None => Ok(()),
        }
    }
}

/// Text of the cell at `idx`, `None` when the cell is empty or absent.
pub fn text_at(row: &[Cell], idx: usize) -> Option<String> {
    row.get(idx).and_then(cell_text)
}

/// Distinct reviewer identifiers in sorted order. Column order of the summary
/// follows this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerSet(Vec<String>);

impl ReviewerSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<BTreeSet<String>> for ReviewerSet {
    fn from(set: BTreeSet<String>) -> Self {
        Self(set.into_iter().collect())
    }
}

impl FromIterator<String> for ReviewerSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        iter.into_iter().collect::<BTreeSet<_>>().into()
    }
}

/// What one reviewer said about one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryEntry {
    /// Selection from the first row seen for this reviewer and item.
    pub selection: String,
    /// Every non-null opinion, in the order the rows were read.
    pub opinions: Vec<String>,
}

/// Item code → reviewer → [`SummaryEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryIndex {
    items: HashMap<String, BTreeMap<String, SummaryEntry>>,
}

impl SummaryIndex {
    /// Records one review row. The selection is only taken from the first row
    /// seen for a given item and reviewer; later rows only add opinions.
    pub fn record(
        &mut self,
        item_code: &str,
        reviewer: &str,
        selection: Option<String>,
        opinion: Option<String>,
    ) {
        let entry = self
            .items
            .entry(item_code.to_string())
            .or_default()
            .entry(reviewer.to_string())
            .or_insert_with(|| SummaryEntry {
                selection: selection.unwrap_or_default(),
                opinions: Vec::new(),
            });

        if let Some(opinion) = opinion {
            entry.opinions.push(opinion);
        }
    }

    /// Reviews recorded for an item, keyed by reviewer.
    pub fn item(&self, item_code: &str) -> Option<&BTreeMap<String, SummaryEntry>> {
        self.items.get(item_code)
    }

    pub fn entry(&self, item_code: &str, reviewer: &str) -> Option<&SummaryEntry> {
        self.item(item_code)?.get(reviewer)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// The consolidated summary, ready to be materialised as a worksheet. Fixed
/// columns keep the typed cells of the first workbook; the opinion and
/// reviewer columns always hold text.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl OutputTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Cell of `column` in the first row whose item code reads `item_code`.
    pub fn cell(&self, item_code: &str, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows
            .iter()
            .find(|row| text_at(row, 0).as_deref() == Some(item_code))
            .and_then(|row| row.get(index))
    }

    /// Text of [`OutputTable::cell`]; an empty cell reads as `""`.
    pub fn text(&self, item_code: &str, column: &str) -> Option<String> {
        self.cell(item_code, column)
            .map(|cell| cell_text(cell).unwrap_or_default())
    }

    /// Every row rendered as text, empty cells as `""`.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell_text(cell).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
