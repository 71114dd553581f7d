use std::path::PathBuf;
use thiserror::Error;

/// Structural failures on a [`crate::table::TimeSeriesTable`].
///
/// Statistical degeneracies (short engines, flat signals, empty samples) are not
/// errors; they surface as `None` or `0.0` in the derived columns.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("missing column `{0}`")]
    MissingColumn(String),
    #[error("column `{column}` holds {found} values, expected {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("column `{column}` has {found} rows but the table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("column `{0}` appears more than once")]
    DuplicateColumn(String),
    #[error("engine {engine_id} has duplicate cycle {cycle}")]
    DuplicateCycle { engine_id: i64, cycle: i64 },
    #[error("column `{0}` already holds z-scores; normalize the raw table instead")]
    AlreadyNormalized(String),
}

pub type TableResult<T> = Result<T, TableError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected {expected} fields, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, column `{column}`: {message}")]
    Parse {
        line: usize,
        column: String,
        message: String,
    },
    #[error("{labels} RUL labels for {engines} test engines")]
    RulLabelCount { labels: usize, engines: usize },
    #[error("RUL label {value} for engine {engine_id} is negative or out of range")]
    InvalidRul { engine_id: i64, value: i64 },
    #[error(transparent)]
    Table(#[from] TableError),
}
