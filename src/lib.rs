//! Core library for the review-merge command line application.
//!
//! The library merges reviewer-annotated workbooks into one summary workbook:
//! one row per item of the first workbook, one selection column per reviewer,
//! and every reviewer's comments folded into a single opinion cell. IO
//! adapters live under [`review::merge::io`], data representations inside
//! [`review::merge::model`], the merge steps in [`review::merge::validate`],
//! [`review::merge::aggregate`] and [`review::merge::build`], and the
//! orchestration used by front ends in [`review::merge::engine`].

pub mod review;

pub use review::merge::{
    ErrorKind, MergeEngine, MergeError, Result, aggregate, build, config, engine, error, io, model,
    telemetry, validate,
};
