use thiserror::Error;

/// Failures raised by the stadium store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot open database {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{operation} failed on table {table}: {source}")]
    Ddl {
        operation: &'static str,
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    pub(crate) fn query(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| StoreError::Query { operation, source }
    }

    pub(crate) fn ddl(operation: &'static str, table: &str) -> impl FnOnce(rusqlite::Error) -> Self {
        let table = table.to_string();
        move |source| StoreError::Ddl {
            operation,
            table,
            source,
        }
    }
}

/// A scraped table row that does not have the expected shape
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid selector '{0}'")]
    Selector(String),

    #[error("{country} row {row}: missing {field}")]
    MissingField {
        country: String,
        row: usize,
        field: &'static str,
    },

    #[error("{country} row {row}: invalid {field} '{value}'")]
    InvalidNumber {
        country: String,
        row: usize,
        field: &'static str,
        value: String,
    },
}
