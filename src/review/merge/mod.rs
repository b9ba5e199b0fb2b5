pub mod aggregate;
pub mod build;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod telemetry;
pub mod validate;

pub use engine::MergeEngine;
pub use error::{ErrorKind, MergeError, Result};
