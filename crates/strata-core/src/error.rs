use std::path::PathBuf;

use chrono::NaiveDate;

use crate::types::Granularity;

/// Errors that can occur across the Strata workspace.
///
/// Metric functions are total and never produce these; only configuration
/// loading, snapshot parsing and an exhausted resampling fallback do.
///
/// # Examples
///
/// ```
/// use strata_core::StrataError;
///
/// let err = StrataError::Config("threshold must be in (0, 1]".into());
/// assert!(err.to_string().contains("threshold"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StrataError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(strata::config))]
    Config(String),

    /// Structurally invalid analysis input (ragged matrix rows and the like).
    #[error("invalid input: {0}")]
    #[diagnostic(code(strata::input))]
    InvalidInput(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Every granularity in the fallback chain produced zero boundaries.
    #[error(
        "cannot resample {start}..={end} at {requested} granularity (tried: {attempts})",
        attempts = format_attempts(.attempted)
    )]
    #[diagnostic(
        code(strata::timeline::unresamplable),
        help("the range is shorter than one unit of every granularity tried; resample at day granularity or widen the range")
    )]
    UnresamplableRange {
        /// Granularity the caller asked for.
        requested: Granularity,
        /// Every granularity tried, in order.
        attempted: Vec<Granularity>,
        /// First day of the series.
        start: NaiveDate,
        /// Last day of the series.
        end: NaiveDate,
    },
}

fn format_attempts(attempted: &[Granularity]) -> String {
    attempted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
