use thiserror::Error;

/// Failures on the per-query decision path. None of these are fatal to the
/// process.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Query was empty or whitespace-only; no decision is produced.
    #[error("query must not be empty")]
    EmptyQuery,

    /// The evidence collaborator could not be read.
    #[error("evidence source error: {0}")]
    Evidence(String),
}

/// Invalid engine configuration, rejected at load time.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} {constraint}, got {value}")]
    Constraint {
        field: &'static str,
        constraint: &'static str,
        value: f64,
    },

    #[error("JSON parse error: {0}")]
    Parse(String),
}

/// Failures of a whole evaluation run.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// Every held-out record was excluded, so coverage has no denominator.
    #[error("no usable held-out records: {total} read, {excluded} excluded")]
    NoUsableRecords { total: usize, excluded: usize },

    /// The tau grid cannot span [0, 1].
    #[error("tau grid needs at least 2 points, got {0}")]
    GridTooSmall(usize),
}

/// Failure of a single held-out record; logged and excluded from aggregation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("line {line}: malformed record: {message}")]
    Malformed { line: usize, message: String },

    #[error("record {id}: neither a label nor a gold answer is present")]
    MissingLabel { id: String },
}
