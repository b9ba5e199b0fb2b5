use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::review::merge::config::ColumnNames;
use crate::review::merge::error::{MergeError, Result};
use crate::review::merge::model::{ReviewerSet, RowSet, SummaryIndex, text_at};

/// Builds the per-item, per-reviewer summary of every row set, together with
/// the sorted set of reviewers.
///
/// Row sets are visited in the given order and rows in file order. Rows
/// without an item code or a reviewer are skipped. The selection of a
/// reviewer for an item is taken from the first row seen; later rows only add
/// their opinion. Blank opinions are kept, empty cells are not.
pub fn aggregate(
    row_sets: &[RowSet],
    columns: &ColumnNames,
) -> Result<(SummaryIndex, ReviewerSet)> {
    let mut index = SummaryIndex::default();
    let mut reviewers: BTreeSet<String> = BTreeSet::new();

    for row_set in row_sets {
        row_set.check_shape()?;
        let code_idx = row_set.require_column(&columns.item_code)?;
        let reviewer_idx = row_set.require_column(&columns.reviewer)?;
        let selection_idx = row_set.require_column(&columns.selection)?;
        let opinion_idx = row_set.require_column(&columns.opinion)?;

        let mut skipped = 0usize;
        for row in &row_set.rows {
            let reviewer = text_at(row, reviewer_idx);
            if let Some(reviewer) = &reviewer {
                if !reviewers.contains(reviewer) {
                    reviewers.insert(reviewer.clone());
                }
            }

            let (Some(code), Some(reviewer)) = (text_at(row, code_idx), reviewer) else {
                skipped += 1;
                continue;
            };

            index.record(
                &code,
                &reviewer,
                text_at(row, selection_idx),
                text_at(row, opinion_idx),
            );
        }

        if skipped > 0 {
            warn!(
                path = %row_set.source.display(),
                skipped,
                "skipped rows without item code or reviewer"
            );
        }
        debug!(
            path = %row_set.source.display(),
            rows = row_set.rows.len(),
            "aggregated row set"
        );
    }

    if reviewers.is_empty() {
        return Err(MergeError::NoReviewers);
    }

    let reviewers = ReviewerSet::from(reviewers);
    info!(
        reviewers = reviewers.len(),
        items = index.item_count(),
        "aggregated reviews"
    );
    Ok((index, reviewers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::merge::error::ErrorKind;
    use crate::review::merge::model::{Cell, CellValue};

    fn columns() -> Vec<String> {
        ["item_code", "reviewer", "selection", "opinion"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn row(
        code: Option<&str>,
        reviewer: Option<&str>,
        selection: Option<&str>,
        opinion: Option<&str>,
    ) -> Vec<Cell> {
        [code, reviewer, selection, opinion]
            .into_iter()
            .map(|cell| cell.map(Into::into))
            .collect()
    }

    #[test]
    fn reviewer_set_is_union_across_files() {
        let first = RowSet::new(
            "a.xlsx",
            columns(),
            vec![row(Some("1"), Some("kim"), Some("Y"), None)],
        );
        let second = RowSet::new(
            "b.xlsx",
            columns(),
            vec![
                row(Some("1"), Some("ahn"), Some("N"), None),
                row(None, Some("park"), None, Some("orphan")),
                row(Some("2"), Some("kim"), None, None),
            ],
        );

        let (index, reviewers) =
            aggregate(&[first, second], &ColumnNames::default()).expect("aggregated");

        assert_eq!(reviewers.as_slice(), ["ahn", "kim", "park"]);
        assert_eq!(index.item_count(), 2);
        assert!(index.entry("1", "park").is_none());
    }

    #[test]
    fn first_selection_wins_across_files() {
        let first = RowSet::new(
            "a.xlsx",
            columns(),
            vec![row(Some("1"), Some("kim"), Some("Y"), Some("good"))],
        );
        let second = RowSet::new(
            "b.xlsx",
            columns(),
            vec![row(Some("1"), Some("kim"), Some("N"), Some("on reflection, no"))],
        );

        let (index, _) = aggregate(&[first, second], &ColumnNames::default()).expect("aggregated");
        let entry = index.entry("1", "kim").expect("entry recorded");

        assert_eq!(entry.selection, "Y");
        assert_eq!(entry.opinions, vec!["good", "on reflection, no"]);
    }

    #[test]
    fn numeric_codes_and_reviewers_are_keyed_by_text() {
        let rows = RowSet::new(
            "a.xlsx",
            columns(),
            vec![
                vec![
                    Some(CellValue::Number(101.0)),
                    Some(CellValue::Number(7.0)),
                    Some("Y".into()),
                    None,
                ],
                row(Some("101"), Some("7"), Some("N"), Some("same reviewer")),
            ],
        );

        let (index, reviewers) = aggregate(&[rows], &ColumnNames::default()).expect("aggregated");

        assert_eq!(reviewers.as_slice(), ["7"]);
        let entry = index.entry("101", "7").expect("entry recorded");
        assert_eq!(entry.selection, "Y");
        assert_eq!(entry.opinions, vec!["same reviewer"]);
    }

    #[test]
    fn no_reviewer_is_a_processing_error() {
        let only = RowSet::new(
            "a.xlsx",
            columns(),
            vec![row(Some("1"), None, Some("Y"), Some("who am I"))],
        );

        let error = aggregate(&[only], &ColumnNames::default()).unwrap_err();
        assert!(matches!(error, MergeError::NoReviewers));
        assert!(!error.is_validation());
    }

    #[test]
    fn missing_column_is_reported() {
        let broken = RowSet::new(
            "a.xlsx",
            vec!["item_code".into(), "reviewer".into()],
            Vec::new(),
        );

        let error = aggregate(&[broken], &ColumnNames::default()).unwrap_err();
        assert!(matches!(
            error,
            MergeError::MissingColumn { ref column, .. } if column == "selection"
        ));
    }

    #[test]
    fn short_row_is_a_processing_error() {
        let ragged = RowSet::new(
            "a.xlsx",
            columns(),
            vec![vec![Some("1".into()), Some("kim".into())]],
        );

        let error = aggregate(&[ragged], &ColumnNames::default()).unwrap_err();
        assert!(matches!(
            error,
            MergeError::RaggedRow { row: 2, expected: 4, found: 2, .. }
        ));
        assert_eq!(error.kind(), ErrorKind::DataProcessing);
    }
}
