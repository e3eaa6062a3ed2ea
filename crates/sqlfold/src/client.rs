//! Driver seam between statement execution and a MySQL-compatible server.
//!
//! A [`Driver`] owns one live session. It sends SQL text and reports rows with
//! per-column provenance (alias table and physical table), which the result
//! formatter needs to fold joined rows.

use crate::config::ConnectionConfig;
use crate::result::RecordSet;
use std::fmt;

/// Error reported by a driver: server error code plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub code: u32,
    pub message: String,
}

impl DriverError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for DriverError {}

/// Raw outcome of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    /// Rows for statements that return a result set; empty otherwise.
    pub records: RecordSet,
    /// Rows changed by INSERT/UPDATE/DELETE.
    pub affected_rows: u64,
    /// Auto-increment id generated by the last INSERT, `0` when none.
    pub last_insert_id: u64,
}

impl RawResult {
    pub fn rows(records: RecordSet) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn affected(affected_rows: u64, last_insert_id: u64) -> Self {
        Self {
            records: RecordSet::default(),
            affected_rows,
            last_insert_id,
        }
    }
}

/// A synchronous database session.
pub trait Driver: Sized {
    /// Open a session. Fails on handshake or authentication errors.
    fn connect(config: &ConnectionConfig) -> Result<Self, DriverError>;

    /// Apply the connection character set.
    fn set_charset(&mut self, charset: &str) -> Result<(), DriverError>;

    /// Execute one SQL statement.
    fn execute(&mut self, sql: &str) -> Result<RawResult, DriverError>;
}
