use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Broad classes of failure, used by callers to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input file set is unusable. Nothing was processed or written.
    Validation,
    /// Aggregation, merging, or persistence failed. No output is valid.
    DataProcessing,
    /// The tool itself could not be configured.
    Configuration,
}

/// Error type covering the different failure cases that can occur while the
/// tool validates, merges, or saves review workbooks.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Raised when no input workbook was supplied.
    #[error("no input workbooks were selected")]
    NoInputFiles,

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a workbook cannot be opened or parsed.
    #[error("unable to read workbook {path}: {source}")]
    UnreadableInput {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// Raised when a workbook contains no worksheet at all.
    #[error("workbook {0} contains no worksheet")]
    EmptyWorkbook(PathBuf),

    /// Raised when a workbook lacks one or more of the required columns.
    #[error(
        "file {path} is missing columns ({missing_list}); required: {required_list}",
        missing_list = .missing.join(", "),
        required_list = .required.join(", ")
    )]
    MissingColumns {
        path: PathBuf,
        missing: Vec<String>,
        required: Vec<String>,
    },

    /// Raised when none of the rows across all workbooks names a reviewer.
    #[error("no reviewer found in the selected workbooks")]
    NoReviewers,

    /// Raised when a row set lacks a column the merge depends on.
    #[error("column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// Raised when a row does not hold one cell per column.
    #[error("row {row} of {path} has {found} cells but the header has {expected} columns")]
    RaggedRow {
        path: PathBuf,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// Wrapper for IO failures such as writing the output file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a configuration file is not valid JSON for
    /// [`MergeConfig`](crate::config::MergeConfig).
    #[error("invalid configuration file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl MergeError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MergeError::NoInputFiles
            | MergeError::MissingInput(_)
            | MergeError::UnreadableInput { .. }
            | MergeError::EmptyWorkbook(_)
            | MergeError::MissingColumns { .. } => ErrorKind::Validation,
            MergeError::NoReviewers
            | MergeError::MissingColumn { .. }
            | MergeError::RaggedRow { .. }
            | MergeError::Write(_)
            | MergeError::Io(_) => ErrorKind::DataProcessing,
            MergeError::Config { .. } | MergeError::Logging(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` when the input set was rejected before any processing.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
