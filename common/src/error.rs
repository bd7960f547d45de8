use std::path::PathBuf;

use thiserror::Error;

/// Failures of the report pipeline, in the order they can occur: opening the
/// input, parsing rows, drawing the chart, saving the image. Every variant is
/// fatal; nothing is retried and no partial chart is ever written.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot open input {}: {}", .path.display(), .source)]
    InputMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Line {line}: expected 3 columns, found {found}")]
    ColumnCount { line: u64, found: usize },
    #[error("Line {line}, column {column}: {value:?} is not a number")]
    InvalidNumber {
        line: u64,
        column: usize,
        value: String,
    },
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Chart rendering failed: {0}")]
    Render(String),
    #[error("Cannot write chart to {}: {}", .path.display(), .source)]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
