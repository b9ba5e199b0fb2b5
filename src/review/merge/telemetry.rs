//! Tracing initialisation for the command-line front end.
//!
//! Verbosity follows `RUST_LOG` and falls back to `info`. Events go to stderr,
//! or to a dated log file when a log directory is supplied.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::review::merge::error::{MergeError, Result};

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. Returns the log file path when logging to
/// a directory.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(chrono::Local::now().date_naive()));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
                .map_err(|err| MergeError::Logging(err.to_string()))?;
            Ok(Some(path))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .try_init()
                .map_err(|err| MergeError::Logging(err.to_string()))?;
            Ok(None)
        }
    }
}

/// One log file per day.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("review_merge_{}.log", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_files_are_named_by_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid date");
        assert_eq!(log_file_name(date), "review_merge_20250307.log");
    }
}
