//! In-memory driver for tests and for hosts without a live server.

use crate::client::{Driver, DriverError, RawResult};
use crate::config::ConnectionConfig;
use crate::result::RecordSet;
use std::collections::VecDeque;

/// Character sets accepted by [`RecordingDriver::set_charset`].
pub const KNOWN_CHARSETS: &[&str] = &[
    "utf8", "utf8mb3", "utf8mb4", "latin1", "ascii", "binary", "utf16", "utf32",
];

/// MySQL client error code for an unknown character set.
const ER_UNKNOWN_CHARACTER_SET: u32 = 1115;
/// MySQL client error code for a failed connection.
const CR_CONNECTION_ERROR: u32 = 2002;

/// A [`Driver`] that records every statement and replays queued responses.
///
/// Responses are consumed in order; with an empty queue every statement
/// succeeds with no rows and no affected rows.
///
/// ```
/// use sqlfold::testing::RecordingDriver;
/// use sqlfold::{Column, Database, RecordSet};
///
/// let mut driver = RecordingDriver::new();
/// driver.push_rows(RecordSet::new(vec![Column::from_table("user", "id")]).with_row([1]));
///
/// let mut db = Database::from_driver(driver);
/// let result = db.select("user").field("id").run(&mut db)?;
/// assert_eq!(result.num_rows(), 1);
/// assert_eq!(db.driver().executed(), ["SELECT `id` FROM `user`"]);
/// # Ok::<(), sqlfold::SqlError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    responses: VecDeque<Result<RawResult, DriverError>>,
    executed: Vec<String>,
    charset: Option<String>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result set. The affected row count is the number of rows, as MySQL reports for SELECT.
    pub fn push_rows(&mut self, records: RecordSet) {
        let affected_rows = records.len() as u64;
        self.responses.push_back(Ok(RawResult {
            records,
            affected_rows,
            last_insert_id: 0,
        }));
    }

    pub fn push_affected(&mut self, affected_rows: u64, last_insert_id: u64) {
        self.responses
            .push_back(Ok(RawResult::affected(affected_rows, last_insert_id)));
    }

    pub fn push_error(&mut self, error: DriverError) {
        self.responses.push_back(Err(error));
    }

    /// Every SQL statement received, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    pub fn last_executed(&self) -> Option<&str> {
        self.executed.last().map(String::as_str)
    }

    /// Charset applied by the last successful `set_charset`.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Number of queued responses not yet consumed.
    pub fn pending(&self) -> usize {
        self.responses.len()
    }
}

impl Driver for RecordingDriver {
    fn connect(config: &ConnectionConfig) -> Result<Self, DriverError> {
        if config.host.trim().is_empty() {
            return Err(DriverError::new(
                CR_CONNECTION_ERROR,
                "Can't connect to MySQL server: empty host",
            ));
        }
        Ok(Self::new())
    }

    fn set_charset(&mut self, charset: &str) -> Result<(), DriverError> {
        if !KNOWN_CHARSETS.contains(&charset) {
            return Err(DriverError::new(
                ER_UNKNOWN_CHARACTER_SET,
                format!("Unknown character set: '{charset}'"),
            ));
        }
        self.charset = Some(charset.to_string());
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<RawResult, DriverError> {
        self.executed.push(sql.to_string());
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(RawResult::default()))
    }
}
