use http::StatusCode;
use thiserror::Error;

/// Result type alias for ingest operations
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

/// Errors that can occur while handling an ingestion request
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Request body is not a 2-D array of values: {0}")]
    MalformedTable(String),

    #[error("Table has no header row")]
    MissingHeaderRow,

    #[error("Header row has no fields")]
    EmptyHeaderRow,

    #[error("Header cell {index} is not a string")]
    NonStringHeader { index: usize },

    #[error("Row {row} has {got} values but the header has {expected} fields")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Row {row} has no usable identifier in its first column")]
    MissingRowKey { row: usize },

    #[error("Store error: {0}")]
    Store(#[from] docstore::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// HTTP status the error maps to. Client-side payload problems are 400,
    /// everything else is a server failure.
    pub fn status(&self) -> StatusCode {
        match self {
            IngestError::RequestBodyError(_)
            | IngestError::MalformedTable(_)
            | IngestError::MissingHeaderRow
            | IngestError::EmptyHeaderRow
            | IngestError::NonStringHeader { .. }
            | IngestError::RowLengthMismatch { .. }
            | IngestError::MissingRowKey { .. } => StatusCode::BAD_REQUEST,
            IngestError::Store(_) | IngestError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
