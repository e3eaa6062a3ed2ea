//! # sqlfold
//!
//! A small SQL statement builder and result folder for MySQL-compatible servers.
//!
//! ## Features
//!
//! - **One builder, four statements**: `select`, `update`, `insert`, `delete` share
//!   a single [`StatementBuilder`]; illegal calls for a kind are reported, never ignored
//! - **Loose filters, canonical SQL**: filter input in any of four JSON shapes
//!   normalizes to the same OR-of-AND-groups WHERE clause
//! - **Escaping everywhere**: identifiers are quoted per segment, values are rendered
//!   as escaped literals
//! - **Safe defaults**: DELETE/UPDATE require WHERE unless `force()`, UPDATE requires SET
//! - **Result folding**: joined rows fold into nested records keyed by the main table
//! - **Query monitoring**: hooks and monitors around every statement, `tracing` output
//!   behind the `tracing` feature
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use sqlfold::testing::RecordingDriver;
//! use sqlfold::{Column, Database, RecordSet, Value};
//!
//! let mut driver = RecordingDriver::new();
//! driver.push_rows(
//!     RecordSet::new(vec![
//!         Column::from_table("post", "id"),
//!         Column::from_table("post", "title"),
//!         Column::from_table("tag", "label"),
//!     ])
//!     .with_row([Value::Int(1), "Hello".into(), "rust".into()])
//!     .with_row([Value::Int(1), "Hello".into(), "sql".into()]),
//! );
//! let mut db = Database::from_driver(driver);
//!
//! let posts = db
//!     .select("post")
//!     .fields(["post.id", "post.title", "tag.label"])
//!     .left_join("tag", None, "tag.post_id", "=", "post.id")
//!     .conditions(&json!([["post.published", "=", true]]))
//!     .run(&mut db)?
//!     .formatted_fetch_all("post", "id")?;
//!
//! assert_eq!(
//!     serde_json::to_value(&posts).unwrap(),
//!     json!({"1": {"id": 1, "title": "Hello", "tag": [{"label": "rust"}, {"label": "sql"}]}})
//! );
//! # Ok::<(), sqlfold::SqlError>(())
//! ```

pub mod builder;
pub mod client;
pub mod condition;
pub mod config;
pub mod database;
pub mod error;
pub mod escape;
pub mod field;
pub mod format;
pub mod monitor;
pub mod normalize;
pub mod prelude;
pub mod query;
pub mod result;
pub mod testing;
pub mod value;

pub use builder::{JoinClause, JoinKind, Method, Order, StatementBuilder, StatementKind};
pub use client::{Driver, DriverError, RawResult};
pub use condition::{ConditionLeaf, ConditionTree, Operator};
pub use config::ConnectionConfig;
pub use database::Database;
pub use error::{SqlError, SqlResult};
pub use escape::{BoolStyle, Dialect, Escaper};
pub use field::FieldExpression;
pub use format::{FormattedSet, Record, ResultFormatter};
pub use monitor::{
    CompositeHook, CompositeMonitor, HookAction, LoggingMonitor, MonitorConfig, NoopMonitor,
    QueryContext, QueryHook, QueryMonitor, QueryResult, QueryStats, StatsMonitor,
};
pub use normalize::normalize;
pub use query::{Query, query};
pub use result::{Column, ExecutionResult, RecordSet, Row};
pub use value::Value;

#[cfg(feature = "tracing")]
pub use monitor::TracingSqlHook;

/// SELECT builder using the default dialect.
pub fn select(table: &str) -> StatementBuilder {
    StatementBuilder::new(StatementKind::Select, Escaper::default(), table, None)
}

/// UPDATE builder using the default dialect.
pub fn update(table: &str) -> StatementBuilder {
    StatementBuilder::new(StatementKind::Update, Escaper::default(), table, None)
}

/// INSERT builder using the default dialect.
pub fn insert(table: &str) -> StatementBuilder {
    StatementBuilder::new(StatementKind::Insert, Escaper::default(), table, None)
}

/// DELETE builder using the default dialect.
pub fn delete(table: &str) -> StatementBuilder {
    StatementBuilder::new(StatementKind::Delete, Escaper::default(), table, None)
}
