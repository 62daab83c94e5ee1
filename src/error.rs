//! Error types for ingestion.

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Why an ingestion run failed.
///
/// Every variant aborts the run. Parse and resolution failures are kept
/// apart so a bad numeric cell can be told from a status row that points at
/// an unknown bear.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{file}: no header matches column {column} (accepted: {accepted})")]
    MissingColumn {
        file: String,
        column: &'static str,
        accepted: String,
    },

    #[error("{file}:{line}: column {column}: cannot parse {value:?} as {expected}")]
    Parse {
        file: String,
        line: u64,
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{file}:{line}: no deployment with BearID {bear_id}")]
    Resolution {
        file: String,
        line: u64,
        bear_id: i64,
    },

    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema error: {0}")]
    Schema(String),
}

impl IngestError {
    /// A cell could not be coerced to its column type.
    pub fn is_parse(&self) -> bool {
        matches!(self, IngestError::Parse { .. })
    }

    /// A status row named a BearID with no deployment.
    pub fn is_resolution(&self) -> bool {
        matches!(self, IngestError::Resolution { .. })
    }

    /// Short failure class for the top-level "ingestion failed" report
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::MissingColumn { .. } => "header",
            IngestError::Parse { .. } => "parse",
            IngestError::Resolution { .. } => "resolution",
            IngestError::Open { .. } | IngestError::Io(_) => "io",
            IngestError::Csv(_) => "csv",
            IngestError::Store(_) => "store",
            IngestError::Schema(_) => "schema",
        }
    }
}
