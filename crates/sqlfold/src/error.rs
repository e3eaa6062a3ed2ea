//! Error types for sqlfold

use crate::builder::{Method, StatementKind};
use thiserror::Error;

/// Result type alias for sqlfold operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Error types for statement construction and execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SqlError {
    /// Builder method is not legal for the statement kind
    #[error("{method} is not supported for {kind} statements")]
    UnsupportedOperation { method: Method, kind: StatementKind },

    /// Operator outside the supported set
    #[error("Unrecognized operator '{0}'")]
    UnrecognizedOperator(String),

    /// Order direction other than ASC/DESC
    #[error("Unrecognized order method '{0}'")]
    UnrecognizedOrder(String),

    /// Identifier refused for security reasons
    #[error("Refused to parse identifier '{0}' for security reasons")]
    UnsafeIdentifier(String),

    /// Filter input is not one of the accepted shapes
    #[error("Wrong condition format: {0}")]
    MalformedCondition(String),

    /// Value cannot be rendered in this position
    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    /// UPDATE without any SET assignment
    #[error("Cannot build an update without changes")]
    NoChanges,

    /// Strict SELECT rendering without projection
    #[error("Cannot build a select query without fields")]
    EmptyProjection,

    /// Unconditional UPDATE/DELETE without `force()`
    #[error("Unable to perform {0} without conditions, call force() to allow it")]
    MissingCondition(StatementKind),

    /// Join condition declared before any join
    #[error("Cannot define join conditions before defining a join")]
    NoActiveJoin,

    /// Column requested by the formatter is not in the result set
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// Driver rejected the statement
    #[error("SQL error {code}: {message} (query: {sql})")]
    Statement {
        code: u32,
        message: String,
        sql: String,
    },

    /// Connection handshake failed
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Requested character set could not be applied
    #[error("Unable to set database charset: {0}")]
    Charset(String),

    /// A query hook refused the statement
    #[error("Query aborted: {0}")]
    Aborted(String),

    /// Connection configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SqlError {
    /// Create a malformed condition error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCondition(message.into())
    }

    /// Create an unsupported value error
    pub fn unsupported_value(message: impl Into<String>) -> Self {
        Self::UnsupportedValue(message.into())
    }

    /// Create a statement error for a driver rejection
    pub fn statement(code: u32, message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Statement {
            code,
            message: message.into(),
            sql: sql.into(),
        }
    }

    /// Check if the error was raised while building (before any SQL reached the driver)
    pub fn is_build_error(&self) -> bool {
        !matches!(
            self,
            Self::Statement { .. } | Self::Connection(_) | Self::Charset(_) | Self::Aborted(_)
        )
    }

    /// Check if this is a driver-reported statement error
    pub fn is_statement_error(&self) -> bool {
        matches!(self, Self::Statement { .. })
    }

    /// Driver error code, if any
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Statement { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<url::ParseError> for SqlError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
