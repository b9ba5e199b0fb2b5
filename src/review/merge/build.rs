use std::collections::{BTreeMap, HashSet};

use tracing::info;

use crate::review::merge::config::MergeConfig;
use crate::review::merge::error::Result;
use crate::review::merge::model::{
    Cell, CellValue, OutputTable, ReviewerSet, RowSet, SummaryEntry, SummaryIndex, text_at,
};

/// Produces the summary table.
///
/// Rows and fixed columns come from `first`, the first input workbook, with the
/// reviewer, selection and opinion columns removed and repeated item codes
/// collapsed onto their first occurrence. Each row then gets the consolidated
/// opinion and one selection column per reviewer.
///
/// Column order: item code, the remaining fixed columns in their original
/// order, the consolidated opinion, then the reviewers in sorted order.
pub fn build_table(
    first: &RowSet,
    reviewers: &ReviewerSet,
    index: &SummaryIndex,
    config: &MergeConfig,
) -> Result<OutputTable> {
    first.check_shape()?;
    let names = &config.columns;
    let code_idx = first.require_column(&names.item_code)?;

    let fixed: Vec<usize> = std::iter::once(code_idx)
        .chain(
            first
                .columns
                .iter()
                .enumerate()
                .filter(|(idx, name)| *idx != code_idx && !names.is_review_column(name))
                .map(|(idx, _)| idx),
        )
        .collect();

    let mut columns: Vec<String> = fixed
        .iter()
        .map(|&idx| first.columns[idx].clone())
        .collect();
    columns.push(names.opinion.clone());
    columns.extend(reviewers.iter().map(String::from));

    let mut seen: HashSet<Option<String>> = HashSet::new();
    let mut rows = Vec::new();

    for source_row in &first.rows {
        let code = text_at(source_row, code_idx);
        if !seen.insert(code.clone()) {
            continue;
        }

        let mut cells: Vec<Cell> = Vec::with_capacity(columns.len());
        cells.extend(
            fixed
                .iter()
                .map(|&idx| source_row.get(idx).cloned().flatten()),
        );

        let reviews = code.as_deref().and_then(|code| index.item(code));
        match reviews {
            Some(reviews) => {
                let opinion = consolidate_opinions(reviewers, reviews, &config.marker);
                cells.push(Some(CellValue::Text(opinion)));
                cells.extend(reviewers.iter().map(|reviewer| {
                    let selection = reviews
                        .get(reviewer)
                        .map(|entry| entry.selection.clone())
                        .unwrap_or_default();
                    Some(CellValue::Text(selection))
                }));
            }
            None => {
                let blanks = reviewers.len() + 1;
                cells.extend((0..blanks).map(|_| Some(CellValue::Text(String::new()))));
            }
        }

        rows.push(cells);
    }

    info!(
        rows = rows.len(),
        columns = columns.len(),
        "summary table built"
    );
    Ok(OutputTable {
        sheet_name: config.sheet_name.clone(),
        columns,
        rows,
    })
}

/// Joins every opinion of every reviewer into `"<marker><reviewer>: <opinion>"`
/// lines, reviewers in set order and each reviewer's opinions in the order
/// they were collected. Returns an empty string when nobody commented.
pub fn consolidate_opinions(
    reviewers: &ReviewerSet,
    reviews: &BTreeMap<String, SummaryEntry>,
    marker: &str,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    for reviewer in reviewers.iter() {
        let Some(entry) = reviews.get(reviewer) else {
            continue;
        };
        lines.extend(
            entry
                .opinions
                .iter()
                .map(|opinion| format!("{marker}{reviewer}: {opinion}")),
        );
    }
    lines.join("\n")
}
