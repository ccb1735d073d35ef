use thiserror::Error;

use crate::query::{ColumnType, QueryKind};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("missing parameter :{0}")]
    MissingParameter(String),
    #[error("unknown parameter :{0}")]
    UnknownParameter(String),
    #[error("parameter :{name} expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: ColumnType,
        found: &'static str,
    },
    #[error("failed to decode row: {0}")]
    Decode(String),
    #[error("query {query} is a {kind} query")]
    WrongKind { query: String, kind: QueryKind },
}

impl From<diesel::result::Error> for DatabaseError {
    fn from(err: diesel::result::Error) -> Self {
        DatabaseError::Query(err.to_string())
    }
}
