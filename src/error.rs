use thiserror::Error;

/// Main error type for query evaluation
///
/// All errors are scoped to a single query: a malformed or unsupported query
/// aborts its own evaluation and leaves the engine usable for the next one.
#[derive(Error, Debug)]
pub enum QuerentError {
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("The {op} operator is not supported by the {model} retrieval model")]
    UnsupportedOperator { op: String, model: &'static str },

    #[error("The {op} operator does not support a default score")]
    NoDefaultScore { op: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(u32),

    #[error("Index error: {0}")]
    Index(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for query evaluation
pub type Result<T> = std::result::Result<T, QuerentError>;

impl QuerentError {
    /// Check whether this error was caused by the query text itself,
    /// as opposed to the index or the environment
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            QuerentError::Syntax(_)
                | QuerentError::UnknownField(_)
                | QuerentError::UnsupportedOperator { .. }
                | QuerentError::NoDefaultScore { .. }
                | QuerentError::InvalidQuery(_)
        )
    }
}
